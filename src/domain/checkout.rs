use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Category, OrderStatus, ValidationError};

pub const MAX_NOTES_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(alias = "gcash")]
    GCash,
    #[serde(alias = "maya")]
    Maya,
    #[serde(alias = "cash")]
    Cash,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::GCash, PaymentMethod::Maya, PaymentMethod::Cash];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::GCash => "GCash",
            PaymentMethod::Maya => "Maya",
            PaymentMethod::Cash => "Cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownPaymentMethod(s.to_string()))
    }
}

/// When the customer collects the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupTime {
    /// As soon as it is ready, within the canteen's fixed window.
    Now,
    At(DateTime<Utc>),
}

impl PickupTime {
    /// Latest moment the order may be collected before it expires.
    pub fn deadline(
        &self,
        placed_at: DateTime<Utc>,
        now_window: Duration,
        grace: Duration,
    ) -> DateTime<Utc> {
        let due = match self {
            PickupTime::Now => placed_at + now_window,
            PickupTime::At(at) => *at,
        };
        due + grace
    }
}

impl fmt::Display for PickupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickupTime::Now => f.write_str("now"),
            PickupTime::At(at) => f.write_str(&at.to_rfc3339()),
        }
    }
}

impl FromStr for PickupTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(PickupTime::Now);
        }
        DateTime::parse_from_rfc3339(s)
            .map(|at| PickupTime::At(at.with_timezone(&Utc)))
            .map_err(|_| ValidationError::InvalidPickupTime(s.to_string()))
    }
}

/// One ordered product with the values it had at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub category: Category,
    pub image: Option<String>,
    pub quantity: i32,
    pub price: i64,
}

impl OrderLine {
    pub fn subtotal(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub pickup_time: PickupTime,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
}

/// Trims notes, drops them when blank and enforces the length limit.
pub fn normalize_notes(notes: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_NOTES_CHARS {
        return Err(ValidationError::NotesTooLong(chars));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_now_and_rfc3339() {
        assert_eq!("NOW".parse::<PickupTime>(), Ok(PickupTime::Now));
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 4, 30, 0).unwrap();
        assert_eq!(
            "2026-03-02T12:30:00+08:00".parse::<PickupTime>(),
            Ok(PickupTime::At(at))
        );
        assert!(matches!(
            "later".parse::<PickupTime>(),
            Err(ValidationError::InvalidPickupTime(_))
        ));
    }

    #[test]
    fn deadline_adds_window_for_now_and_grace_for_both() {
        let placed = Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap();
        let window = Duration::minutes(10);
        let grace = Duration::minutes(30);
        assert_eq!(
            PickupTime::Now.deadline(placed, window, grace),
            placed + Duration::minutes(40)
        );
        let at = placed + Duration::hours(2);
        assert_eq!(
            PickupTime::At(at).deadline(placed, window, grace),
            at + Duration::minutes(30)
        );
    }

    #[test]
    fn notes_are_trimmed_and_limited() {
        assert_eq!(normalize_notes(None), Ok(None));
        assert_eq!(normalize_notes(Some("   ".into())), Ok(None));
        assert_eq!(
            normalize_notes(Some(" no onions ".into())),
            Ok(Some("no onions".into()))
        );
        assert!(normalize_notes(Some("a".repeat(500))).is_ok());
        assert_eq!(
            normalize_notes(Some("a".repeat(501))),
            Err(ValidationError::NotesTooLong(501))
        );
    }

    #[test]
    fn payment_method_accepts_lowercase() {
        assert_eq!("gcash".parse::<PaymentMethod>(), Ok(PaymentMethod::GCash));
        let parsed: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Cash);
        assert_eq!(serde_json::to_string(&PaymentMethod::GCash).unwrap(), "\"GCash\"");
    }
}

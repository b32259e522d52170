use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

/// Lifecycle of an order.
///
/// The regular path is `pending -> preparing -> ready -> delivered`.
/// `expired` is a terminal side exit taken by `ready` orders that were never
/// picked up before their deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Expired,
}

impl OrderStatus {
    /// Statuses shown in the canteen queue.
    pub const ACTIVE: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Expired => "expired",
        }
    }

    /// The status one step forward, or `None` from a terminal status.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Expired => None,
        }
    }

    /// Moves exactly one step forward; a no-op at a terminal status.
    pub fn advance(self) -> OrderStatus {
        self.next().unwrap_or(self)
    }

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_one_step_at_a_time() {
        let pending = OrderStatus::Pending;
        assert_eq!(pending.advance(), OrderStatus::Preparing);
        assert_eq!(pending.advance().advance(), OrderStatus::Ready);
        assert_eq!(pending.advance().advance().advance(), OrderStatus::Delivered);
    }

    #[test]
    fn advance_is_a_no_op_at_terminal_states() {
        assert_eq!(OrderStatus::Delivered.advance(), OrderStatus::Delivered);
        assert_eq!(OrderStatus::Expired.advance(), OrderStatus::Expired);
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn only_queue_statuses_are_active() {
        let active: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        assert_eq!(active, OrderStatus::ACTIVE.to_vec());
    }

    #[test]
    fn parses_stored_and_mixed_case_values() {
        assert_eq!("ready".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert_eq!(" Delivered ".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(ValidationError::UnknownStatus("shipped".into()))
        );
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"preparing\"");
    }
}

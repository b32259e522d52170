use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Category;

/// Totals in centavos.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AdminDashboardStats {
    pub total_orders: i64,
    pub total_revenue: i64,
    pub total_users: i64,
    pub total_products: i64,
    pub pending_orders: i64,
    pub preparing_orders: i64,
    pub ready_orders: i64,
    pub completed_orders: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CanteenDashboardStats {
    pub pending_orders: i64,
    pub preparing_orders: i64,
    pub ready_orders: i64,
    pub completed_today: i64,
    pub revenue_today: i64,
}

/// Window of orders a report covers. `week` and `month` are rolling 7 and 30
/// days; `today` starts at local midnight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    Today,
    Week,
    Month,
    #[default]
    All,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub range: Option<ReportRange>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ReportSummary {
    pub orders: i64,
    /// Delivered orders only, in centavos.
    pub revenue: i64,
    pub completed: i64,
    pub pending: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub product_count: i64,
    pub total_stock: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminReport {
    pub range: ReportRange,
    /// Start of the window; absent for `all`.
    pub since: Option<DateTime<Utc>>,
    pub summary: ReportSummary,
    pub top_products: Vec<TopProduct>,
    pub categories: Vec<CategoryBreakdown>,
}

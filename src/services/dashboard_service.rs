use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

use crate::{
    domain::OrderStatus,
    dto::dashboard::{
        AdminDashboardStats, AdminReport, CanteenDashboardStats, CategoryBreakdown, ReportQuery,
        ReportRange, ReportSummary, TopProduct,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::stored,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOP_PRODUCTS: i64 = 10;

/// Revenue only counts delivered orders.
pub async fn admin_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminDashboardStats>> {
    ensure_admin(user)?;

    let stats = sqlx::query_as::<_, AdminDashboardStats>(
        r#"
        SELECT
            COUNT(*) AS total_orders,
            COALESCE(SUM(total_amount) FILTER (WHERE status = $1), 0)::BIGINT AS total_revenue,
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM products) AS total_products,
            COUNT(*) FILTER (WHERE status = $2) AS pending_orders,
            COUNT(*) FILTER (WHERE status = $3) AS preparing_orders,
            COUNT(*) FILTER (WHERE status = $4) AS ready_orders,
            COUNT(*) FILTER (WHERE status = $1) AS completed_orders
        FROM orders
        "#,
    )
    .bind(OrderStatus::Delivered.as_str())
    .bind(OrderStatus::Pending.as_str())
    .bind(OrderStatus::Preparing.as_str())
    .bind(OrderStatus::Ready.as_str())
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

/// Queue sizes plus what was handed over since local midnight.
pub async fn canteen_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CanteenDashboardStats>> {
    ensure_staff(user)?;
    let since = start_of_day(Utc::now(), state.config.business_offset());

    let stats = sqlx::query_as::<_, CanteenDashboardStats>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status = $1) AS pending_orders,
            COUNT(*) FILTER (WHERE status = $2) AS preparing_orders,
            COUNT(*) FILTER (WHERE status = $3) AS ready_orders,
            COUNT(*) FILTER (WHERE status = $4 AND updated_at >= $5) AS completed_today,
            COALESCE(SUM(total_amount) FILTER (WHERE status = $4 AND updated_at >= $5), 0)::BIGINT
                AS revenue_today
        FROM orders
        "#,
    )
    .bind(OrderStatus::Pending.as_str())
    .bind(OrderStatus::Preparing.as_str())
    .bind(OrderStatus::Ready.as_str())
    .bind(OrderStatus::Delivered.as_str())
    .bind(since)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

/// Sales over a window plus a catalog breakdown by category.
///
/// The summary and best sellers cover orders placed since the window start;
/// best sellers only count delivered orders. The category breakdown is the
/// current catalog.
pub async fn admin_report(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<AdminReport>> {
    ensure_admin(user)?;
    let range = query.range.unwrap_or_default();
    let since = range_start(range, Utc::now(), state.config.business_offset());

    let summary = sqlx::query_as::<_, ReportSummary>(
        r#"
        SELECT
            COUNT(*) AS orders,
            COALESCE(SUM(total_amount) FILTER (WHERE status = $2), 0)::BIGINT AS revenue,
            COUNT(*) FILTER (WHERE status = $2) AS completed,
            COUNT(*) FILTER (WHERE status = $3) AS pending
        FROM orders
        WHERE $1::TIMESTAMPTZ IS NULL OR created_at >= $1
        "#,
    )
    .bind(since)
    .bind(OrderStatus::Delivered.as_str())
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&state.pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT
            oi.product_id,
            (ARRAY_AGG(oi.name ORDER BY o.created_at DESC))[1] AS name,
            SUM(oi.quantity)::BIGINT AS quantity,
            SUM(oi.price * oi.quantity)::BIGINT AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.status = $2 AND ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1)
        GROUP BY oi.product_id
        ORDER BY quantity DESC, revenue DESC, oi.product_id
        LIMIT $3
        "#,
    )
    .bind(since)
    .bind(OrderStatus::Delivered.as_str())
    .bind(TOP_PRODUCTS)
    .fetch_all(&state.pool)
    .await?;

    let categories = sqlx::query_as::<_, (String, i64, i64)>(
        r#"
        SELECT category, COUNT(*), COALESCE(SUM(stock), 0)::BIGINT
        FROM products
        GROUP BY category
        ORDER BY category
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(category, product_count, total_stock)| {
        Ok(CategoryBreakdown {
            category: stored(&category)?,
            product_count,
            total_stock,
        })
    })
    .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Report",
        AdminReport {
            range,
            since,
            summary,
            top_products,
            categories,
        },
        Some(Meta::empty()),
    ))
}

/// First instant a report window covers; `None` means no lower bound.
pub fn range_start(
    range: ReportRange,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    match range {
        ReportRange::Today => Some(start_of_day(now, offset)),
        ReportRange::Week => Some(now - Duration::days(7)),
        ReportRange::Month => Some(now - Duration::days(30)),
        ReportRange::All => None,
    }
}

/// Midnight of `now`'s calendar day at `offset`, as a UTC instant.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    now.with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_starts_at_local_midnight() {
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        // 01:30 on the 2nd in Manila is still the 1st in UTC.
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 17, 30, 0).unwrap();
        let start = start_of_day(now, manila);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap());
    }

    #[test]
    fn report_windows() {
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap();

        assert_eq!(
            range_start(ReportRange::Today, now, manila),
            Some(Utc.with_ymd_and_hms(2025, 3, 9, 16, 0, 0).unwrap())
        );
        assert_eq!(
            range_start(ReportRange::Week, now, manila),
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 6, 0, 0).unwrap())
        );
        assert_eq!(
            range_start(ReportRange::Month, now, manila),
            Some(Utc.with_ymd_and_hms(2025, 2, 8, 6, 0, 0).unwrap())
        );
        assert_eq!(range_start(ReportRange::All, now, manila), None);
    }

    #[test]
    fn utc_offset_uses_utc_midnight() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(
            start_of_day(now, utc),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }
}

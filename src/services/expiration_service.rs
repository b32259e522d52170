use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    domain::OrderStatus,
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppResult,
    state::AppState,
};

/// Marks every ready order whose pickup deadline has passed as expired.
/// Returns how many orders changed.
pub async fn expire_overdue_orders(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Expired.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Status.eq(OrderStatus::Ready.as_str()))
        .filter(OrderCol::PickupDeadline.lt(now.fixed_offset()))
        .exec(&state.orm)
        .await?;

    Ok(result.rows_affected)
}

/// Runs [`expire_overdue_orders`] on a fixed interval for the life of the
/// process.
pub fn spawn_expiration_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(state.config.expiration_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match expire_overdue_orders(&state, Utc::now()).await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "expired overdue orders"),
                Err(err) => tracing::error!(error = %err, "order expiration sweep failed"),
            }
        }
    })
}

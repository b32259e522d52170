use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        dashboard::CanteenDashboardStats,
        orders::{AdvanceOrderRequest, OrderQueue, OrderWithItems},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{dashboard_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/active", get(active_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/advance", post(advance_order))
        .route("/dashboard/stats", get(dashboard_stats))
}

#[utoipa::path(
    get,
    path = "/api/canteen/orders/active",
    responses(
        (status = 200, description = "Pending, preparing and ready orders, oldest first", body = ApiResponse<OrderQueue>),
        (status = 403, description = "Canteen staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Canteen"
)]
pub async fn active_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderQueue>>> {
    let resp = order_service::active_queue(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/canteen/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its items", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Canteen staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Canteen"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order_staff(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/canteen/orders/{id}/advance",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AdvanceOrderRequest,
    responses(
        (status = 200, description = "Order moved to the next status", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Canteen staff only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Stored status differs from expected_status")
    ),
    security(("bearer_auth" = [])),
    tag = "Canteen"
)]
pub async fn advance_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<AdvanceOrderRequest>>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = order_service::advance_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/canteen/dashboard/stats",
    responses(
        (status = 200, description = "Queue sizes and today's handovers", body = ApiResponse<CanteenDashboardStats>),
        (status = 403, description = "Canteen staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Canteen"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CanteenDashboardStats>>> {
    let resp = dashboard_service::canteen_stats(&state, &user).await?;
    Ok(Json(resp))
}

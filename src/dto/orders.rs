use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{OrderStatus, PaymentMethod},
    models::{Order, OrderItem},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub payment_method: Option<PaymentMethod>,
    /// `now` or an RFC 3339 date-time.
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
}

/// Move an order one step forward. When `expected_status` is given and the
/// stored status differs, the request is rejected with 409.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdvanceOrderRequest {
    pub expected_status: Option<OrderStatus>,
}

/// Admin override; any status is accepted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Orders still being worked on, oldest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderQueue {
    pub items: Vec<OrderWithItems>,
}

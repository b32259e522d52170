use thiserror::Error;
use uuid::Uuid;

/// Rejections produced by the cart, checkout and enum parsing rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quantity {0} is invalid: must be between 1 and 20")]
    InvalidQuantity(i32),

    #[error("cart already holds {current} of this product; adding {requested} would exceed 20")]
    QuantityLimitExceeded { current: i32, requested: i32 },

    #[error("product {0} is not in the cart")]
    LineNotFound(Uuid),

    #[error("product {0} is out of stock")]
    OutOfStock(Uuid),

    #[error("insufficient stock for {product}: {available} left")]
    InsufficientStock { product: String, available: i32 },

    #[error("{0} is no longer on the menu")]
    ProductUnavailable(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("pickup time is required")]
    MissingPickupTime,

    #[error("invalid pickup time {0:?}: expected \"now\" or an RFC 3339 date-time")]
    InvalidPickupTime(String),

    #[error("pickup time must not be in the past")]
    PickupInPast,

    #[error("notes are {0} characters long; the limit is 500")]
    NotesTooLong(usize),

    #[error("order total is too large")]
    TotalOverflow,

    #[error("unknown order status {0:?}")]
    UnknownStatus(String),

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("unknown payment method {0:?}")]
    UnknownPaymentMethod(String),

    #[error("unknown role {0:?}")]
    UnknownRole(String),
}

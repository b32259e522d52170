//! Business rules with no database or HTTP dependencies. Services load rows
//! into these types, apply an operation and persist the outcome.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod favorites;
pub mod order_status;
pub mod role;

pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY, ProductSnapshot};
pub use catalog::Category;
pub use checkout::{MAX_NOTES_CHARS, OrderDraft, OrderLine, PaymentMethod, PickupTime};
pub use error::ValidationError;
pub use favorites::Toggle;
pub use order_status::OrderStatus;
pub use role::Role;

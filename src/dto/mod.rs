pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod users;

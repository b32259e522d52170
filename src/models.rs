use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{Category, OrderStatus, PaymentMethod, Role, ValidationError},
    entity::{cart_items, favorites, order_items, orders, products, users},
    error::AppError,
};

/// Public view of an account; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prices are in centavos.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: Category,
    pub stock: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub category: Category,
    pub image: Option<String>,
    pub quantity: i32,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// `now` or an RFC 3339 date-time.
    pub pickup_time: String,
    pub pickup_deadline: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub category: Category,
    pub image: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

/// Parses an enum column; a value the code does not know is a server fault.
pub(crate) fn stored<T>(value: &str) -> Result<T, AppError>
where
    T: FromStr<Err = ValidationError>,
{
    value
        .parse()
        .map_err(|err: ValidationError| AppError::Internal(anyhow::Error::new(err)))
}

impl TryFrom<users::Model> for User {
    type Error = AppError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(User {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone_number: model.phone_number,
            role: stored(&model.role)?,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<products::Model> for Product {
    type Error = AppError;

    fn try_from(model: products::Model) -> Result<Self, Self::Error> {
        Ok(Product {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: stored(&model.category)?,
            stock: model.stock,
            image: model.image,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Favorite {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<cart_items::Model> for CartItem {
    type Error = AppError;

    fn try_from(model: cart_items::Model) -> Result<Self, Self::Error> {
        Ok(CartItem {
            id: model.id,
            product_id: model.product_id,
            subtotal: model.price * i64::from(model.quantity),
            name: model.name,
            price: model.price,
            category: stored(&model.category)?,
            image: model.image,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<orders::Model> for Order {
    type Error = AppError;

    fn try_from(model: orders::Model) -> Result<Self, Self::Error> {
        Ok(Order {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: stored(&model.status)?,
            payment_method: stored(&model.payment_method)?,
            pickup_time: model.pickup_time,
            pickup_deadline: model.pickup_deadline.with_timezone(&Utc),
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<order_items::Model> for OrderItem {
    type Error = AppError;

    fn try_from(model: order_items::Model) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            subtotal: model.price * i64::from(model.quantity),
            name: model.name,
            category: stored(&model.category)?,
            image: model.image,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

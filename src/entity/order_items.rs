use sea_orm::entity::prelude::*;

/// A line of a placed order. Product values are copied at checkout and
/// `product_id` is not a foreign key, so history survives catalog deletes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Zero-based line index within the order, in cart order.
    pub position: i32,
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub quantity: i32,
    /// Unit price in centavos at checkout.
    pub price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{Cart, CartLine, ProductSnapshot},
    dto::cart::{AddToCartRequest, CartView, SetQuantityRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, stored},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let cart = cart_from_rows(&rows)?;
    let total_amount = cart.total()?;
    let item_count = cart.lines().iter().map(|l| i64::from(l.quantity)).sum();

    let items = rows
        .into_iter()
        .map(CartItem::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::all(items.len() as i64);

    Ok(ApiResponse::success(
        "OK",
        CartView {
            items,
            total_amount,
            item_count,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;

    // The owner row lock serializes adds to one cart, including a product's
    // first add. NO KEY UPDATE leaves foreign key checks unblocked.
    Users::find_by_id(user.user_id)
        .lock(LockType::NoKeyUpdate)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".into()))?;

    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let mut cart = cart_from_rows(&rows)?;
    let quantity = cart
        .add_line(snapshot_of(&product)?, payload.quantity)?
        .quantity;

    let existing = rows.into_iter().find(|r| r.product_id == payload.product_id);
    let item = match existing {
        Some(row) => {
            let mut active: CartActive = row.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                name: Set(product.name.clone()),
                price: Set(product.price),
                category: Set(product.category.clone()),
                image: Set(product.image.clone()),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", CartItem::try_from(item)?, None))
}

/// Sets a line's quantity, clamped to 1..=20 and to the product's stock.
pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let txn = state.orm.begin().await?;

    let row = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let stock = Products::find_by_id(product_id)
        .one(&txn)
        .await?
        .map(|p| p.stock);

    let mut cart = Cart::from_lines([line_from_row(&row)?]);
    let quantity = cart.set_quantity(product_id, payload.quantity, stock)?;

    let mut active: CartActive = row.into();
    active.quantity = Set(quantity);
    let item = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success("Quantity updated", CartItem::try_from(item)?, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}

pub(crate) fn snapshot_of(product: &ProductModel) -> AppResult<ProductSnapshot> {
    Ok(ProductSnapshot {
        product_id: product.id,
        name: product.name.clone(),
        price: product.price,
        category: stored(&product.category)?,
        image: product.image.clone(),
    })
}

pub(crate) fn line_from_row(row: &CartModel) -> AppResult<CartLine> {
    Ok(CartLine {
        product: ProductSnapshot {
            product_id: row.product_id,
            name: row.name.clone(),
            price: row.price,
            category: stored(&row.category)?,
            image: row.image.clone(),
        },
        quantity: row.quantity,
    })
}

pub(crate) fn cart_from_rows(rows: &[CartModel]) -> AppResult<Cart> {
    let lines = rows.iter().map(line_from_row).collect::<AppResult<Vec<_>>>()?;
    Ok(Cart::from_lines(lines))
}

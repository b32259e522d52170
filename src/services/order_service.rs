use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{OrderStatus, PickupTime, ValidationError},
    dto::orders::{AdvanceOrderRequest, CheckoutRequest, OrderList, OrderQueue, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem, stored},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::{cart_from_rows, snapshot_of},
    state::AppState,
};

/// The caller's own orders, newest first unless asked otherwise.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_filtered(state, condition, query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Places an order from the caller's cart.
///
/// Cart lines are re-priced from the current catalog, stock is checked and
/// decremented, and the cart is emptied, all in one transaction.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let pickup_time = payload
        .pickup_time
        .as_deref()
        .map(str::parse::<PickupTime>)
        .transpose()?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;

    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let mut cart = cart_from_rows(&rows)?;

    if !rows.is_empty() {
        let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        let products: HashMap<Uuid, _> = Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .lock(LockType::Update)
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for row in &rows {
            let product = products
                .get(&row.product_id)
                .ok_or_else(|| ValidationError::ProductUnavailable(row.name.clone()))?;
            if product.stock < row.quantity {
                return Err(ValidationError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                }
                .into());
            }
            cart.refresh_snapshot(snapshot_of(product)?);
        }
    }

    let draft = cart.checkout(payload.payment_method, pickup_time, payload.notes, now)?;
    let deadline = draft.pickup_time.deadline(
        draft.placed_at,
        state.config.pickup_now_window(),
        state.config.pickup_grace(),
    );

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(draft.total_amount),
        status: Set(draft.status.as_str().to_string()),
        payment_method: Set(draft.payment_method.as_str().to_string()),
        pickup_time: Set(draft.pickup_time.to_string()),
        pickup_deadline: Set(deadline.into()),
        notes: Set(draft.notes.clone()),
        created_at: Set(draft.placed_at.into()),
        updated_at: Set(draft.placed_at.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(draft.lines.len());
    for (position, line) in (0..).zip(draft.lines) {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            position: Set(position),
            product_id: Set(line.product_id),
            name: Set(line.name),
            category: Set(line.category.as_str().to_string()),
            image: Set(line.image),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(&txn)
            .await?;

        items.push(OrderItem::try_from(item)?);
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, total = order.total_amount, "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Pending, preparing and ready orders for the kitchen, oldest first.
pub async fn active_queue(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderQueue>> {
    ensure_staff(user)?;

    let active: Vec<&str> = OrderStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
    let items = Orders::find()
        .filter(OrderCol::Status.is_in(active))
        .order_by_asc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id)
        .find_with_related(OrderItems)
        .order_by_asc(OrderItemCol::Position)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, items)| assemble(order, items))
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::all(items.len() as i64);
    Ok(ApiResponse::success("Active orders", OrderQueue { items }, Some(meta)))
}

pub async fn get_order_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = find_with_items(&state.orm, id).await?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Moves an order one step along pending → preparing → ready → delivered.
///
/// Terminal orders are returned unchanged. A stale `expected_status` is a
/// conflict.
pub async fn advance_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdvanceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderStatus = stored(&order.status)?;
    if let Some(expected) = payload.expected_status {
        if expected != current {
            return Err(AppError::Conflict(format!(
                "order is {current}, expected {expected}"
            )));
        }
    }

    let next = current.advance();
    let order = if next != current {
        let mut active: OrderActive = order.into();
        active.status = Set(next.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        order
    };

    let order = with_items(&txn, order).await?;
    txn.commit().await?;

    if next != current {
        tracing::info!(order_id = %id, from = %current, to = %next, "order advanced");
        audit::record(
            &state.pool,
            Some(user.user_id),
            "order_advance",
            "orders",
            serde_json::json!({ "order_id": id, "from": current, "to": next }),
        )
        .await;
    }

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

pub(crate) async fn list_filtered(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub(crate) async fn find_with_items<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<OrderWithItems> {
    let order = Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    with_items(conn, order).await
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;
    assemble(order, items)
}

fn assemble(order: OrderModel, items: Vec<OrderItemModel>) -> AppResult<OrderWithItems> {
    Ok(OrderWithItems {
        order: Order::try_from(order)?,
        items: items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<AppResult<Vec<_>>>()?,
    })
}

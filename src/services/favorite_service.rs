use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::Toggle,
    dto::favorites::{AddFavoriteRequest, FavoriteProductList, ToggleFavoriteResponse},
    entity::{
        favorites::Column as FavCol,
        products::{Entity as Products, Relation as ProductRelation},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Favorite, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Favorited products, most recently favorited first.
pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteProductList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find()
        .join(sea_orm::JoinType::InnerJoin, ProductRelation::Favorites.def())
        .filter(FavCol::UserId.eq(user.user_id))
        .order_by_desc(FavCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", FavoriteProductList { items }, Some(meta)))
}

/// Adding a product that is already a favorite returns the existing entry.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    ensure_product_exists(&state.pool, payload.product_id).await?;

    let favorite = match find_favorite(&state.pool, user.user_id, payload.product_id).await? {
        Some(fav) => fav,
        None => insert_favorite(&state.pool, user.user_id, payload.product_id).await?,
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_add",
        "favorites",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        favorite,
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !delete_favorite(&state.pool, user.user_id, product_id).await? {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_remove",
        "favorites",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Adds the favorite when absent, removes it when present.
pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<ToggleFavoriteResponse>> {
    let present = find_favorite(&state.pool, user.user_id, product_id)
        .await?
        .is_some();

    let outcome = Toggle::from_presence(present);
    match outcome {
        // A concurrent toggle may already have removed it; the result is the same.
        Toggle::Removed => {
            delete_favorite(&state.pool, user.user_id, product_id).await?;
        }
        Toggle::Added => {
            ensure_product_exists(&state.pool, product_id).await?;
            insert_favorite(&state.pool, user.user_id, product_id).await?;
        }
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_toggle",
        "favorites",
        serde_json::json!({ "product_id": product_id, "outcome": outcome }),
    )
    .await;

    Ok(ApiResponse::success(
        "Favorite toggled",
        ToggleFavoriteResponse {
            product_id,
            outcome,
            is_favorite: outcome.is_favorite(),
        },
        Some(Meta::empty()),
    ))
}

async fn ensure_product_exists(pool: &DbPool, product_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Product not found".into())),
    }
}

async fn find_favorite(pool: &DbPool, user_id: Uuid, product_id: Uuid) -> AppResult<Option<Favorite>> {
    let favorite = sqlx::query_as::<_, Favorite>(
        "SELECT * FROM favorites WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(favorite)
}

/// Insert that tolerates a concurrent insert of the same pair.
async fn insert_favorite(pool: &DbPool, user_id: Uuid, product_id: Uuid) -> AppResult<Favorite> {
    let favorite = sqlx::query_as::<_, Favorite>(
        r#"
        INSERT INTO favorites (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(favorite)
}

async fn delete_favorite(pool: &DbPool, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

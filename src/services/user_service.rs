use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserList, UserListQuery},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::{NewAccount, create_account, email_taken, normalize_email, required},
    state::AppState,
};

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", User::try_from(model)?, Some(Meta::empty())))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(required("first_name", &first_name)?);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(required("last_name", &last_name)?);
    }
    if let Some(email) = payload.email {
        let email = normalize_email(&email);
        if !email.contains('@') {
            return Err(AppError::BadRequest("email is invalid".into()));
        }
        if email_taken(&state.orm, &email, Some(user.user_id)).await? {
            return Err(AppError::BadRequest("Email is already taken".into()));
        }
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone_number {
        active.phone_number = Set(Some(phone).filter(|p| !p.trim().is_empty()));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Profile updated", User::try_from(updated)?, Some(Meta::empty())))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = Pagination::new(query.page, query.per_page).normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role {
        condition = condition.add(UserCol::Role.eq(role.as_str()));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let created = create_account(
        &state.orm,
        NewAccount {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone_number: payload.phone_number,
            password: payload.password,
            role: payload.role,
        },
    )
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id, "role": created.role }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::try_from(created)?, Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(required("first_name", &first_name)?);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(required("last_name", &last_name)?);
    }
    if let Some(phone) = payload.phone_number {
        active.phone_number = Set(Some(phone).filter(|p| !p.trim().is_empty()));
    }
    if let Some(role) = payload.role {
        if id == user.user_id && role != user.role {
            return Err(AppError::BadRequest("Admins cannot change their own role".into()));
        }
        active.role = Set(role.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role }),
    )
    .await;

    Ok(ApiResponse::success("User updated", User::try_from(updated)?, Some(Meta::empty())))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest("Admins cannot delete their own account".into()));
    }

    // Orders reference their customer with ON DELETE RESTRICT.
    let result = match Users::delete_by_id(id).exec(&state.orm).await {
        Ok(result) => result,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
            return Err(AppError::Conflict(
                "user has placed orders and cannot be deleted".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    };
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

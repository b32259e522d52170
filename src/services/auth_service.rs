use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::Role,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Fields needed to create any account.
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub role: Role,
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        first_name,
        last_name,
        email,
        phone_number,
        password,
    } = payload;

    let user = create_account(
        &state.orm,
        NewAccount {
            first_name,
            last_name,
            email,
            phone_number,
            password,
            role: Role::Customer,
        },
    )
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::success("User created", User::try_from(user)?, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = normalize_email(&email);

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(invalid_credentials()),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let user = User::try_from(user)?;
    let (token, expires_at) = issue_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_ttl(),
        Utc::now(),
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_at,
        landing_page: user.role.landing_page().to_string(),
        user,
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Inserts a user after checking the email is free.
pub async fn create_account<C: ConnectionTrait>(
    conn: &C,
    account: NewAccount,
) -> AppResult<UserModel> {
    let first_name = required("first_name", &account.first_name)?;
    let last_name = required("last_name", &account.last_name)?;
    let email = normalize_email(&account.email);
    if !email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".into()));
    }
    if account.password.is_empty() {
        return Err(AppError::BadRequest("password is required".into()));
    }

    if email_taken(conn, &email, None).await? {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&account.password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name),
        last_name: Set(last_name),
        email: Set(email),
        phone_number: Set(account.phone_number.filter(|p| !p.trim().is_empty())),
        password_hash: Set(password_hash),
        role: Set(account.role.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(user)
}

pub async fn email_taken<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    except: Option<Uuid>,
) -> AppResult<bool> {
    let mut finder = Users::find().filter(UserCol::Email.eq(email));
    if let Some(id) = except {
        finder = finder.filter(UserCol::Id.ne(id));
    }
    Ok(finder.one(conn).await?.is_some())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Signs a token for `user_id` valid for `ttl` from `now`.
pub fn issue_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> AppResult<(String, DateTime<Utc>)> {
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expiration))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    const SECRET: &str = "test-secret";

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn issued_token_decodes_to_same_user_and_role() {
        let user_id = Uuid::new_v4();
        let (token, expires_at) = issue_token(
            user_id,
            Role::CanteenPersonnel,
            SECRET,
            Duration::hours(24),
            Utc::now(),
        )
        .unwrap();

        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::CanteenPersonnel);
        assert_eq!(claims.exp as i64, expires_at.timestamp());
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let user_id = Uuid::new_v4();
        let (expired, _) = issue_token(
            user_id,
            Role::Customer,
            SECRET,
            Duration::hours(-2),
            Utc::now(),
        )
        .unwrap();
        assert!(matches!(
            decode_token(&expired, SECRET),
            Err(AppError::Unauthorized(_))
        ));

        let (token, _) =
            issue_token(user_id, Role::Admin, SECRET, Duration::hours(1), Utc::now()).unwrap();
        assert!(decode_token(&token, "another-secret").is_err());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Juan@Campus.EDU "), "juan@campus.edu");
    }
}

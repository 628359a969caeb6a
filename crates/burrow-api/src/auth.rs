use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

use burrow_db::Database;
use burrow_db::queries::users::NewUser;
use burrow_types::api::{CheckPasswordRequest, Claims, LoginRequest, RegisterRequest};
use burrow_types::models::Role;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::notify::Notifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub notifier: Notifier,
}

const DEFAULT_PF_IMG: &str = "/assets/default-avatar.png";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::validation("First and last name are required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }
    validate_password_policy(&req.password)?;

    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::conflict("Email already taken"));
    }

    let password_hash = hash_password(&req.password)?;
    let pf_img_url = req.pf_img_url.as_deref().unwrap_or(DEFAULT_PF_IMG);

    let user_id = state.db.create_user(&NewUser {
        first_name: req.first_name.trim(),
        last_name: req.last_name.trim(),
        email: &req.email,
        password_hash: &password_hash,
        role: Role::User,
        pf_img_url,
    })?;

    let token = issue_token(&state, user_id, Role::User)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "message": "User created successfully",
            "token": token,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::unauthenticated("Incorrect email or password"))?;

    verify_password(&req.password, &user.password)
        .map_err(|_| ApiError::unauthenticated("Incorrect email or password"))?;

    let token = issue_token(&state, user.id, user.role)?;

    let followers = state.db.follower_count(user.id)?;
    let followings = state.db.following_count(user.id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "User logged in successfully",
        "data": {
            "token": token,
            "user": {
                "id": user.id,
                "first_name": user.first_name,
                "last_name": user.last_name,
                "email": user.email,
                "role": user.role,
                "pf_img_url": user.pf_img_url,
                "followers": followers,
                "followings": followings,
            },
        },
    })))
}

/// Revoke the token that authenticated this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.db.delete_session(&current.token_id)?;
    Ok(Json(json!({
        "status": 200,
        "message": "User logged out successfully",
    })))
}

/// Revoke every session the user holds.
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.db.delete_user_sessions(current.id())?;
    Ok(Json(json!({
        "status": 200,
        "message": "User logged out from all devices successfully",
    })))
}

/// Re-verify the caller's password (used before destructive actions).
pub async fn check_password(
    State(_state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CheckPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    verify_password(&req.password, &current.user.password)
        .map_err(|_| ApiError::unauthenticated("Incorrect password"))?;

    Ok(Json(json!({
        "status": 200,
        "message": "Password matched",
    })))
}

/// Mint a JWT and record its session row so it can be revoked.
pub fn issue_token(state: &AppState, user_id: i64, role: Role) -> ApiResult<String> {
    let jti = Uuid::new_v4().to_string();
    state.db.create_session(user_id, &jti)?;

    let claims = Claims {
        sub: user_id,
        role,
        jti,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(token)
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), ()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| ())?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ())
}

/// At least 8 chars with a lowercase, an uppercase, a digit, and a
/// special character.
pub fn validate_password_policy(password: &str) -> ApiResult<()> {
    const SPECIALS: &str = "@$!%*#?&";

    let ok = password.len() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIALS.contains(c));

    if ok {
        Ok(())
    } else {
        Err(ApiError::validation(
            "Password must be at least 8 characters with upper and lower case letters, \
             a digit, and a special character",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy_accepts_strong_rejects_weak() {
        assert!(validate_password_policy("Str0ng!pw").is_ok());
        assert!(validate_password_policy("short1!").is_err());
        assert!(validate_password_policy("alllowercase1!").is_err());
        assert!(validate_password_policy("ALLUPPERCASE1!").is_err());
        assert!(validate_password_policy("NoDigits!!").is_err());
        assert!(validate_password_policy("NoSpecials11").is_err());
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("Str0ng!pw").unwrap();
        assert!(verify_password("Str0ng!pw", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}

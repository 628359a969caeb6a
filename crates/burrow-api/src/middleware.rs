use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use burrow_db::models::UserRow;
use burrow_types::api::Claims;
use burrow_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;

/// Request-scoped principal: the authenticated user's current row plus
/// the token that authenticated this request. Loaded fresh per request
/// so role changes and revocations take effect immediately.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: Arc<UserRow>,
    pub token_id: String,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

/// Extract and validate the bearer JWT, check it has not been revoked,
/// and attach the principal to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthenticated("Missing bearer token"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthenticated("Missing bearer token"))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthenticated("Invalid token"))?;

    let claims = token_data.claims;

    // Logout deletes the session row, which kills the token even before
    // it expires.
    if !state.db.session_exists(&claims.jti)? {
        return Err(ApiError::unauthenticated("Token revoked"));
    }

    let user = state
        .db
        .get_user_by_id(claims.sub)?
        .ok_or_else(|| ApiError::unauthenticated("Account no longer exists"))?;

    req.extensions_mut().insert(CurrentUser {
        user: Arc::new(user),
        token_id: claims.jti,
    });

    Ok(next.run(req).await)
}

/// Layered behind [`require_auth`] on the /admin subtree.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthenticated("Missing bearer token"))?;

    if !current.is_admin() {
        return Err(ApiError::Forbidden(
            "Forbidden: You do not have permission to access this resource.".into(),
        ));
    }

    Ok(next.run(req).await)
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;

pub async fn like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    if !policy::can_view_post(&current.user, &post) {
        return Err(ApiError::forbidden());
    }

    if state.db.like_exists(current.id(), id)? {
        return Err(ApiError::conflict("Post already liked"));
    }

    state.db.create_like(current.id(), id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Liked post successfully",
    })))
}

pub async fn unlike(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    if !policy::can_view_post(&current.user, &post) {
        return Err(ApiError::forbidden());
    }

    if !state.db.delete_like(current.id(), id)? {
        return Err(ApiError::conflict("Post not liked"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Unliked post successfully",
    })))
}

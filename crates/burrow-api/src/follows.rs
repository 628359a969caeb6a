use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use burrow_types::api::FollowEntry;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct FollowListQuery {
    pub q: Option<String>,
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if current.id() == id {
        return Err(ApiError::validation("You can not follow yourself"));
    }

    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    if state.db.follow_exists(id, current.id())? {
        return Err(ApiError::conflict("You are already following this user"));
    }

    state.db.create_follow(id, current.id())?;

    Ok(Json(json!({
        "status": 200,
        "message": "User followed successfully",
    })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if current.id() == id {
        return Err(ApiError::validation("You can not unfollow yourself"));
    }

    if !state.db.delete_follow(id, current.id())? {
        return Err(ApiError::conflict("You are not following this user"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "User unfollowed successfully",
    })))
}

pub async fn followers(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<FollowListQuery>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let rows = state.db.followers_of(id, current.id(), query.q.as_deref())?;
    let data: Vec<FollowEntry> = rows.into_iter().map(to_entry).collect();

    Ok(Json(json!({
        "status": 200,
        "message": "User followers",
        "data": data,
    })))
}

pub async fn followings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<FollowListQuery>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let rows = state.db.followings_of(id, current.id(), query.q.as_deref())?;
    let data: Vec<FollowEntry> = rows.into_iter().map(to_entry).collect();

    Ok(Json(json!({
        "status": 200,
        "message": "User followings",
        "data": data,
    })))
}

fn to_entry(row: burrow_db::queries::follows::FollowListRow) -> FollowEntry {
    FollowEntry {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        pf_img_url: row.pf_img_url,
        is_following: row.is_following,
    }
}

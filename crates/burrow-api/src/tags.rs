use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use burrow_db::models::TagRow;
use burrow_types::api::TagRequest;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::ts::parse_ts;

#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    pub q: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> ApiResult<impl IntoResponse> {
    let tags: Vec<serde_json::Value> = state
        .db
        .list_tags(query.q.as_deref())?
        .into_iter()
        .map(tag_json)
        .collect();

    Ok(Json(json!({ "status": 200, "tags": tags })))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .db
        .get_tag(id)?
        .ok_or_else(|| ApiError::not_found("Tag"))?;

    Ok(Json(json!({ "status": 200, "tag": tag_json(tag) })))
}

// -- Admin surface --

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_name(&req.name)?;

    if state.db.get_tag_by_name(&req.name)?.is_some() {
        return Err(ApiError::conflict("Tag already exists"));
    }

    state.db.create_tag(&req.name)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Tag created successfully",
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_tag(id)?.is_none() {
        return Err(ApiError::not_found("Tag"));
    }

    validate_name(&req.name)?;

    if let Some(existing) = state.db.get_tag_by_name(&req.name)? {
        if existing.id != id {
            return Err(ApiError::conflict("Tag already exists"));
        }
    }

    state.db.update_tag(id, &req.name)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Tag updated successfully",
    })))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_tag(id)? {
        return Err(ApiError::not_found("Tag"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Tag deleted successfully",
    })))
}

fn validate_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() || name.len() > 255 {
        return Err(ApiError::validation("Tag name must be 1-255 characters"));
    }
    Ok(())
}

fn tag_json(tag: TagRow) -> serde_json::Value {
    json!({
        "id": tag.id,
        "name": tag.name,
        "created_at": parse_ts(&tag.created_at),
        "updated_at": parse_ts(&tag.updated_at),
    })
}

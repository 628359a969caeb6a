use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use burrow_types::api::JoinRequestEntry;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;
use crate::ts::parse_ts;

/// Toggle a join request: a pending request is cancelled, otherwise one
/// is created. Members cannot request.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.membership(id, current.id())?.is_some() {
        return Err(ApiError::conflict("User already in group"));
    }

    if let Some(existing) = state.db.get_request_by_pair(id, current.id())? {
        state.db.delete_request(existing.id)?;
        return Ok((
            StatusCode::OK,
            Json(json!({
                "status": 200,
                "message": "Request deleted successfully",
            })),
        ));
    }

    if state.db.get_group(id)?.is_none() {
        return Err(ApiError::not_found("Group"));
    }

    state.db.create_request(id, current.id())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "message": "Request created successfully",
        })),
    ))
}

/// Pending requests of a group, with requester details; group admins
/// only.
pub async fn pending(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    if !policy::is_group_admin(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    let requests: Vec<JoinRequestEntry> = state
        .db
        .pending_requests_for_group(id)?
        .into_iter()
        .map(|row| JoinRequestEntry {
            id: row.request_id,
            group_id: row.group_id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            pf_img_url: row.pf_img_url,
            created_at: parse_ts(&row.created_at),
        })
        .collect();

    Ok(Json(json!({
        "status": 200,
        "message": "Requests",
        "data": requests,
    })))
}

/// Accept a join request; group admins only. Consumes the request and
/// creates the membership atomically, so a repeated accept finds the
/// request gone.
pub async fn accept(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .db
        .get_request(id)?
        .ok_or_else(|| ApiError::not_found("Request"))?;

    let group = state
        .db
        .get_group(request.group_id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(request.group_id, current.id())?;
    if !policy::is_group_admin(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    if !state.db.accept_request(id)? {
        return Err(ApiError::not_found("Request"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Request accepted successfully",
    })))
}

/// Withdraw or reject a request: the requester themself, or a group
/// admin.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .db
        .get_request(id)?
        .ok_or_else(|| ApiError::not_found("Request"))?;

    let group = state
        .db
        .get_group(request.group_id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(request.group_id, current.id())?;
    if !policy::can_delete_request(&current.user, &group, membership.as_ref(), &request) {
        return Err(ApiError::forbidden());
    }

    state.db.delete_request(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Request deleted successfully",
    })))
}

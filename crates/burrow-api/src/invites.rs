use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use burrow_types::api::{CreateInviteRequest, PendingInviteEntry};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;
use crate::ts::parse_ts;

/// Pending invites of a group; group admins only.
pub async fn index(
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

    let invites: Vec<serde_json::Value> = state
        .db
        .list_group_invites(id)?
        .into_iter()
        .map(|invite| {
            json!({
                "id": invite.id,
                "group_id": invite.group_id,
                "user_id": invite.user_id,
                "created_at": parse_ts(&invite.created_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "invites": invites })))
}

/// The caller's own pending invites, with group details.
pub async fn pending(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let invites: Vec<PendingInviteEntry> = state
        .db
        .pending_invites_for_user(current.id())?
        .into_iter()
        .map(|row| PendingInviteEntry {
            id: row.invite_id,
            group_id: row.group_id,
            title: row.title,
            img_url: row.img_url,
            status: row.status,
            created_at: parse_ts(&row.created_at),
        })
        .collect();

    Ok(Json(json!({ "status": 200, "invites": invites })))
}

/// Invite a user to a group; group admins only. The user must exist,
/// not already belong, and not already be invited.
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<CreateInviteRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    if !policy::is_group_admin(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    if state.db.get_user_by_id(req.user_id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    if state.db.membership(id, req.user_id)?.is_some() {
        return Err(ApiError::conflict("User already exists in group"));
    }

    if state.db.get_invite_by_pair(id, req.user_id)?.is_some() {
        return Err(ApiError::conflict("User already invited to group"));
    }

    state.db.create_invite(id, req.user_id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Invite created successfully",
    })))
}

/// Accept an invite: invited user only. Consumes the invite and creates
/// the membership atomically.
pub async fn accept(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let invite = state
        .db
        .get_invite(id)?
        .ok_or_else(|| ApiError::not_found("Invite"))?;

    if invite.user_id != current.id() {
        return Err(ApiError::forbidden());
    }

    if !state.db.accept_invite(id)? {
        return Err(ApiError::not_found("Invite"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Invite accepted successfully",
    })))
}

/// Cancel an invite by id: the invited user, or a group admin.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let invite = state
        .db
        .get_invite(id)?
        .ok_or_else(|| ApiError::not_found("Invite"))?;

    remove_invite(&state, &current, invite).await
}

/// Cancel an invite addressed by (group, user) instead of invite id.
pub async fn destroy_by_pair(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((group_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    let invite = state
        .db
        .get_invite_by_pair(group_id, user_id)?
        .ok_or_else(|| ApiError::not_found("Invite"))?;

    remove_invite(&state, &current, invite).await
}

async fn remove_invite(
    state: &AppState,
    current: &CurrentUser,
    invite: burrow_db::models::GroupInviteRow,
) -> ApiResult<Json<serde_json::Value>> {
    let group = state
        .db
        .get_group(invite.group_id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(invite.group_id, current.id())?;
    if !policy::can_cancel_invite(&current.user, &group, membership.as_ref(), &invite) {
        return Err(ApiError::forbidden());
    }

    state.db.delete_invite(invite.id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Invite removed successfully",
    })))
}

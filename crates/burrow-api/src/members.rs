use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use burrow_types::api::{CandidateEntry, MemberEntry, RemoveMemberRequest, UpdateMemberRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub q: Option<String>,
}

const CANDIDATE_LIMIT: u32 = 50;

/// Members of a group with user details and group role.
pub async fn index(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_group(id)?.is_none() {
        return Err(ApiError::not_found("Group"));
    }

    let members: Vec<MemberEntry> = state
        .db
        .list_members(id, query.q.as_deref())?
        .into_iter()
        .map(|row| MemberEntry {
            id: row.member_id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            pf_img_url: row.pf_img_url,
            group_role: row.role,
        })
        .collect();

    Ok(Json(json!({ "status": 200, "members": members })))
}

/// Users outside the group, for the invite picker.
pub async fn not_members(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_group(id)?.is_none() {
        return Err(ApiError::not_found("Group"));
    }

    let users: Vec<CandidateEntry> = state
        .db
        .list_non_members(id, current.id(), query.q.as_deref(), CANDIDATE_LIMIT)?
        .into_iter()
        .map(|row| CandidateEntry {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            pf_img_url: row.pf_img_url,
            is_following: row.is_following,
            is_invited: row.is_invited,
        })
        .collect();

    Ok(Json(json!({ "status": 200, "users": users })))
}

/// Change a member's group role. Group-admin authority required; you
/// cannot change yourself, and only a global admin may change another
/// admin member.
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let target = state
        .db
        .membership(id, req.user_id)?
        .ok_or_else(|| ApiError::not_found("Member"))?;

    let actor_membership = state.db.membership(id, current.id())?;

    if target.user_id == current.id() {
        return Err(ApiError::Forbidden("You can't change yourself".into()));
    }

    if !policy::can_edit_member_role(&current.user, &group, actor_membership.as_ref(), &target) {
        return Err(ApiError::forbidden());
    }

    state.db.set_member_role(target.id, req.role)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Member updated successfully",
    })))
}

/// Remove a member. Self-removal always allowed; otherwise group-admin
/// authority with admin-precedence.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<RemoveMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let target = state
        .db
        .membership(id, req.user_id)?
        .ok_or_else(|| ApiError::not_found("Member"))?;

    let actor_membership = state.db.membership(id, current.id())?;

    if !policy::can_remove_member(&current.user, &group, actor_membership.as_ref(), &target) {
        return Err(ApiError::forbidden());
    }

    state.db.delete_member_pair(id, req.user_id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Member removed successfully",
    })))
}

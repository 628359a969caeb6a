use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use burrow_types::api::{
    CreateGroupRequest, DeleteGroupRequest, GroupDetail, GroupSummary, MyGroupEntry,
    TransferGroupRequest, UpdateGroupRequest,
};
use burrow_types::models::{GroupRole, Visibility};

use crate::auth::{AppState, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::notify;
use crate::policy;
use crate::ts::parse_ts;

const DEFAULT_GROUP_IMG: &str = "/assets/default-group.png";

#[derive(Debug, Deserialize)]
pub struct GroupListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MyGroupsQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub search: Option<String>,
}

/// Every group with counts and owner email; also serves the admin
/// dashboard listing.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<GroupListQuery>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.db.list_groups_annotated(query.q.as_deref())?;

    let groups: Vec<GroupSummary> = rows
        .into_iter()
        .map(|row| GroupSummary {
            id: row.group.id,
            title: row.group.title,
            img_url: row.group.img_url,
            owner_id: row.group.owner_id,
            status: row.group.status,
            members_count: row.members_count,
            posts_count: row.posts_count,
            owner_email: row.owner_email,
            created_at: parse_ts(&row.group.created_at),
            updated_at: parse_ts(&row.group.updated_at),
        })
        .collect();

    Ok(Json(json!({ "status": 200, "groups": groups })))
}

/// The caller's groups: owned, joined, or both, with optional status
/// and title filters. Groups the caller administers carry the pending
/// request count.
pub async fn my_groups(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<MyGroupsQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = match query.status.as_deref() {
        Some("public") => Some(Visibility::Public),
        Some("private") => Some(Visibility::Private),
        _ => None,
    };
    let search = query.search.as_deref().unwrap_or("");

    let rows = match query.kind.as_deref() {
        Some("my-group") => state.db.owned_groups(current.id(), status, search)?,
        Some("joined-group") => state.db.joined_groups(current.id(), true, status, search)?,
        _ => state.db.joined_groups(current.id(), false, status, search)?,
    };

    let mut groups = Vec::with_capacity(rows.len());
    for group in rows {
        let is_admin = group.owner_id == current.id()
            || state
                .db
                .membership(group.id, current.id())?
                .is_some_and(|m| m.role == GroupRole::Admin);

        let req_count = if is_admin {
            Some(state.db.pending_request_count(group.id)?)
        } else {
            None
        };

        groups.push(MyGroupEntry {
            id: group.id,
            title: group.title,
            img_url: group.img_url,
            owner_id: group.owner_id,
            status: group.status,
            req_count,
            created_at: parse_ts(&group.created_at),
            updated_at: parse_ts(&group.updated_at),
        });
    }

    Ok(Json(json!({ "status": 200, "groups": groups })))
}

/// Groups owned by another user, with member counts.
pub async fn user_groups(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.db.groups_owned_by(id)?;

    let groups: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(group, members)| {
            json!({
                "id": group.id,
                "title": group.title,
                "img_url": group.img_url,
                "owner_id": group.owner_id,
                "status": group.status,
                "members": members,
                "created_at": parse_ts(&group.created_at),
                "updated_at": parse_ts(&group.updated_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "group": groups })))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    let is_member = group.owner_id == current.id() || membership.is_some();
    let is_admin = group.owner_id == current.id()
        || membership.as_ref().is_some_and(|m| m.role == GroupRole::Admin);

    let is_requesting = if group.status == Visibility::Private {
        Some(state.db.get_request_by_pair(id, current.id())?.is_some())
    } else {
        None
    };

    let invite = state.db.get_invite_by_pair(id, current.id())?;

    let detail = GroupDetail {
        id: group.id,
        title: group.title,
        owner_id: group.owner_id,
        img_url: group.img_url,
        is_member,
        is_admin,
        status: group.status,
        members: state.db.member_count(id)?,
        posts: state.db.group_post_count(id)?,
        is_requesting,
        is_inviting: invite.is_some(),
        invite_id: invite.map(|i| i.id),
        created_at: parse_ts(&group.created_at),
        updated_at: parse_ts(&group.updated_at),
    };

    Ok(Json(json!({ "status": 200, "group": detail })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let img_url = req.img_url.as_deref().unwrap_or(DEFAULT_GROUP_IMG);
    let group_id = state
        .db
        .create_group(current.id(), req.title.trim(), req.status, img_url)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Group created successfully",
        "id": group_id,
    })))
}

/// Update a group; its posts' visibility follows the group status.
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    if !policy::is_group_admin(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    state
        .db
        .update_group(id, req.title.trim(), req.status, req.img_url.as_deref())?;

    Ok(Json(json!({
        "status": 200,
        "message": "Group updated successfully",
    })))
}

/// Delete a group after re-verifying the caller's password; cascades
/// members and posts.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<DeleteGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    verify_password(&req.password, &current.user.password)
        .map_err(|_| ApiError::unauthenticated("Password is incorrect"))?;

    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    if !policy::is_group_admin(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    state.db.delete_group_cascade(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Group deleted successfully",
    })))
}

/// Transfer ownership: owner only, password re-entry, membership of
/// the new owner force-set to admin. Mails the new owner afterwards.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<TransferGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    if group.owner_id != current.id() {
        return Err(ApiError::Forbidden("You are not the owner of this group".into()));
    }

    verify_password(&req.password, &current.user.password)
        .map_err(|_| ApiError::unauthenticated("Password is incorrect"))?;

    let new_owner = state
        .db
        .get_user_by_id(req.new_owner_id)?
        .ok_or_else(|| ApiError::not_found("New owner"))?;

    state.db.transfer_group(id, new_owner.id)?;

    state.notifier.send(notify::transfer_mail(
        &new_owner.email,
        &new_owner.first_name,
        &group.title,
        &current.user.email,
    ));

    Ok(Json(json!({
        "status": 200,
        "message": "Group ownership transferred successfully",
    })))
}

/// Direct join is for public groups; private groups go through join
/// requests.
pub async fn join_public(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    if group.status != Visibility::Public {
        return Err(ApiError::Forbidden("This group is not public".into()));
    }

    if state.db.membership(id, current.id())?.is_some() {
        return Err(ApiError::conflict("You are already a member of this group"));
    }

    state.db.create_member(id, current.id(), GroupRole::Member)?;

    Ok(Json(json!({
        "status": 200,
        "message": "You have joined the group successfully",
    })))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_group(id)?.is_none() {
        return Err(ApiError::not_found("Group"));
    }

    if !state.db.delete_member_pair(id, current.id())? {
        return Err(ApiError::conflict("You are not a member of this group"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "You have left the group successfully",
    })))
}

/// Promote a member to group admin. Owner only; an admin-role member
/// does not qualify.
pub async fn promote(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    set_member_role(&state, &current, member_id, GroupRole::Admin).await?;
    Ok(Json(json!({
        "status": 200,
        "message": "Member promoted to admin successfully",
    })))
}

pub async fn demote(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    set_member_role(&state, &current, member_id, GroupRole::Member).await?;
    Ok(Json(json!({
        "status": 200,
        "message": "Member demoted to member successfully",
    })))
}

async fn set_member_role(
    state: &AppState,
    current: &CurrentUser,
    member_id: i64,
    role: GroupRole,
) -> ApiResult<()> {
    let member = state
        .db
        .get_member(member_id)?
        .ok_or_else(|| ApiError::not_found("Member"))?;

    let group = state
        .db
        .get_group(member.group_id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    if !policy::can_promote(&current.user, &group) {
        return Err(ApiError::forbidden());
    }

    state.db.set_member_role(member_id, role)?;
    Ok(())
}

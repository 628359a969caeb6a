use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use burrow_db::models::{PostRow, PostWithAuthorRow};
use burrow_types::api::{
    CreatePostRequest, GroupPostEntry, PostDetail, PostSummary, RelatedPost, TagInfo,
    UpdatePostRequest,
};
use burrow_types::models::{GroupRole, Role};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;
use crate::ts::parse_ts;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub tag: Option<String>,
}

/// Public feed, optionally narrowed to one tag. The heavy read runs off
/// the async runtime.
pub async fn feed(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<impl IntoResponse> {
    let db = state.clone();
    let viewer = current.id();
    let tag = query.tag;

    let (rows, saved) = tokio::task::spawn_blocking(move || {
        let rows = db.db.public_posts(tag.as_deref())?;
        let saved = db.db.saved_post_ids(viewer)?;
        Ok::<_, anyhow::Error>((rows, saved))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("task join failed"))
    })??;

    let posts: Vec<PostSummary> = rows
        .into_iter()
        .map(|row| summary_from(row, &saved))
        .collect();

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

pub async fn my_posts(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.db.posts_by_user(current.id(), false)?;
    let saved = state.db.saved_post_ids(current.id())?;

    let posts: Vec<PostSummary> = rows
        .into_iter()
        .map(|row| summary_from(row, &saved))
        .collect();

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

pub async fn user_posts(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let rows = state.db.posts_by_user(id, true)?;
    let saved = state.db.saved_post_ids(current.id())?;

    let posts: Vec<PostSummary> = rows
        .into_iter()
        .map(|row| summary_from(row, &saved))
        .collect();

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

/// A group's feed. Private groups are visible to members and global
/// admins only.
pub async fn group_posts(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let group = state
        .db
        .get_group(id)?
        .ok_or_else(|| ApiError::not_found("Group"))?;

    let membership = state.db.membership(id, current.id())?;
    if !policy::can_view_group_posts(&current.user, &group, membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    let is_admin = membership
        .as_ref()
        .is_some_and(|m| m.role == GroupRole::Admin);

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.posts_in_group(id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("task join failed"))
        })??;

    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = state
            .db
            .tags_for_post(row.post.id)?
            .into_iter()
            .map(|t| TagInfo { id: t.id, name: t.name })
            .collect();

        posts.push(GroupPostEntry {
            id: row.post.id,
            user_id: row.post.user_id,
            group_id: id,
            is_admin,
            tags,
            title: row.post.title,
            description: row.post.description,
            img_url: row.post.img_url,
            status: row.post.status,
            first_name: row.first_name,
            last_name: row.last_name,
            user_pf_img_url: row.pf_img_url,
            created_at: parse_ts(&row.post.created_at),
            updated_at: parse_ts(&row.post.updated_at),
        });
    }

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

pub async fn show(
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

    let owner = state
        .db
        .get_user_by_id(post.user_id)?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let group_title = match post.group_id {
        Some(group_id) => state
            .db
            .get_group(group_id)?
            .map(|g| g.title)
            .unwrap_or_default(),
        None => String::new(),
    };

    let tags: Vec<TagInfo> = state
        .db
        .tags_for_post(id)?
        .into_iter()
        .map(|t| TagInfo { id: t.id, name: t.name })
        .collect();

    let detail = PostDetail {
        id: post.id,
        user_id: post.user_id,
        group_id: post.group_id,
        group_title,
        tags,
        title: post.title,
        description: post.description,
        img_url: post.img_url,
        status: post.status,
        like_count: state.db.like_count(id)?,
        is_liked: state.db.like_exists(current.id(), id)?,
        is_saved: state.db.is_post_saved(current.id(), id)?,
        user_name: owner.full_name(),
        user_pf_img_url: owner.pf_img_url,
        created_at: parse_ts(&post.created_at),
        updated_at: parse_ts(&post.updated_at),
    };

    Ok(Json(json!({ "status": 200, "post": detail })))
}

/// Posts related by shared tag or same author, shuffled.
pub async fn related(
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

    let rows = state.db.related_posts(id, post.user_id)?;
    let saved = state.db.saved_post_ids(current.id())?;

    let related: Vec<RelatedPost> = rows
        .into_iter()
        .map(|row| RelatedPost {
            id: row.post.id,
            img_url: row.post.img_url,
            user_id: row.post.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            user_pf_img_url: row.pf_img_url,
            is_saved: saved.contains(&row.post.id),
        })
        .collect();

    Ok(Json(json!({ "status": 200, "relatedPosts": related })))
}

pub async fn highlighted(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let post = state.db.highlighted_post()?;
    Ok(Json(json!({
        "status": 200,
        "highlighted_post": post.map(plain_post_json),
    })))
}

pub async fn latest(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let post = state.db.latest_post()?;
    Ok(Json(json!({
        "status": 200,
        "latest_post": post.map(plain_post_json),
    })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.as_deref().is_some_and(|t| t.len() > 255) {
        return Err(ApiError::validation("Title is too long"));
    }
    if req.description.as_deref().is_some_and(|d| d.len() > 1000) {
        return Err(ApiError::validation("Description is too long"));
    }

    // Group posts inherit the group's visibility at creation time.
    let status = match req.group_id {
        Some(group_id) => state
            .db
            .get_group(group_id)?
            .ok_or_else(|| ApiError::not_found("Group"))?
            .status,
        None => req.status,
    };

    let post_id = state.db.create_post(
        current.id(),
        req.group_id,
        req.title.as_deref().unwrap_or(""),
        req.description.as_deref().unwrap_or(""),
        req.img_url.as_deref().unwrap_or(""),
        status,
        &req.tags,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "message": "Post created successfully",
            "id": post_id,
        })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    if post.user_id != current.id() && current.user.role != Role::Admin {
        return Err(ApiError::forbidden());
    }

    if req.description.as_deref().is_some_and(|d| d.len() > 1000) {
        return Err(ApiError::validation("Description is too long"));
    }
    if req.img_url.is_empty() {
        return Err(ApiError::validation("img_url is required"));
    }

    state.db.update_post(
        id,
        req.title.as_deref().unwrap_or(""),
        req.description.as_deref().unwrap_or(""),
        &req.img_url,
        req.status,
        &req.tags,
    )?;

    Ok(Json(json!({
        "status": 200,
        "message": "Post updated successfully",
    })))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    let group_membership = match post.group_id {
        Some(group_id) => state.db.membership(group_id, current.id())?,
        None => None,
    };

    if !policy::can_delete_post(&current.user, &post, group_membership.as_ref()) {
        return Err(ApiError::forbidden());
    }

    state.db.delete_post_cascade(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Post deleted successfully",
    })))
}

// -- Admin surface --

pub async fn admin_index(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let posts: Vec<serde_json::Value> =
        state.db.all_posts()?.into_iter().map(plain_post_json).collect();
    Ok(Json(json!({ "status": 200, "posts": posts })))
}

pub async fn admin_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    Ok(Json(json!({ "status": 200, "post": plain_post_json(post) })))
}

pub async fn admin_destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_post(id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }

    state.db.delete_post_cascade(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Post deleted successfully",
    })))
}

fn summary_from(row: PostWithAuthorRow, saved: &std::collections::HashSet<i64>) -> PostSummary {
    let full_name = format!("{} {}", row.first_name, row.last_name);
    PostSummary {
        id: row.post.id,
        user_id: row.post.user_id,
        img_url: row.post.img_url,
        is_saved: saved.contains(&row.post.id),
        first_name: row.first_name,
        last_name: row.last_name,
        full_name,
        user_pf_img_url: row.pf_img_url,
        created_at: parse_ts(&row.post.created_at),
        updated_at: parse_ts(&row.post.updated_at),
    }
}

fn plain_post_json(post: PostRow) -> serde_json::Value {
    json!({
        "id": post.id,
        "user_id": post.user_id,
        "group_id": post.group_id,
        "title": post.title,
        "description": post.description,
        "img_url": post.img_url,
        "status": post.status,
        "is_highlighted": post.is_highlighted,
        "created_at": parse_ts(&post.created_at),
        "updated_at": parse_ts(&post.updated_at),
    })
}

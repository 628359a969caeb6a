use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;

use burrow_db::models::{CommentRow, CommentWithAuthorRow};
use burrow_types::api::{CommentEntry, CommentThread, CreateCommentRequest, ReplyCommentRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::policy;
use crate::ts::parse_ts;

/// Comments for a post: top-level newest first, each with its direct
/// replies oldest first. Only one reply level surfaces here — a reply
/// whose parent is itself a reply is stored but not listed.
pub async fn index(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_post(post_id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }

    let db = state.clone();
    let (tops, replies) = tokio::task::spawn_blocking(move || {
        let tops = db.db.top_level_comments(post_id)?;
        let ids: Vec<i64> = tops.iter().map(|c| c.comment.id).collect();
        let replies = db.db.replies_for_comments(&ids)?;
        Ok::<_, anyhow::Error>((tops, replies))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("task join failed"))
    })??;

    let mut reply_map: std::collections::HashMap<i64, Vec<CommentEntry>> =
        std::collections::HashMap::new();
    for reply in replies {
        let parent = reply.comment.reply_cmt_id.unwrap_or_default();
        reply_map.entry(parent).or_default().push(entry_from(reply));
    }

    let comments: Vec<CommentThread> = tops
        .into_iter()
        .map(|top| {
            let replies = reply_map.remove(&top.comment.id).unwrap_or_default();
            CommentThread {
                comment: entry_from(top),
                replies,
            }
        })
        .collect();

    Ok(Json(json!({
        "status": 200,
        "message": "Comments retrieved successfully",
        "comments": comments,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.comment.trim().is_empty() {
        return Err(ApiError::validation("Comment text is required"));
    }
    if state.db.get_post(req.post_id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }
    if let Some(parent_id) = req.reply_cmt_id {
        if state.db.get_comment(parent_id)?.is_none() {
            return Err(ApiError::not_found("Comment"));
        }
    }

    let row = state
        .db
        .create_comment(current.id(), req.post_id, &req.comment, req.reply_cmt_id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Comment created successfully",
        "comment": authored_json(&current, row),
    })))
}

/// Reply to a comment; the post id is inherited from the parent.
pub async fn reply(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ReplyCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.comment.trim().is_empty() {
        return Err(ApiError::validation("Comment text is required"));
    }

    let parent = state
        .db
        .get_comment(id)?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    let row = state
        .db
        .create_comment(current.id(), parent.post_id, &req.comment, Some(parent.id))?;

    Ok(Json(json!({
        "status": 200,
        "message": "Reply created successfully",
        "reply": authored_json(&current, row),
    })))
}

/// Soft-redact: blanks the text but keeps the row and its replies.
/// Allowed for the comment's author, the post's owner, and global
/// admins. The admin-only hard delete is a separate endpoint.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .db
        .get_comment(id)?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    let post = state
        .db
        .get_post(comment.post_id)?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    if !policy::can_redact_comment(&current.user, comment.user_id, post.user_id) {
        return Err(ApiError::forbidden());
    }

    state.db.blank_comment(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Comment deleted successfully",
    })))
}

// -- Admin surface --

pub async fn admin_index(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let comments: Vec<serde_json::Value> = state
        .db
        .all_comments()?
        .into_iter()
        .map(plain_comment_json)
        .collect();
    Ok(Json(json!({ "status": 200, "comments": comments })))
}

pub async fn admin_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .db
        .get_comment(id)?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    Ok(Json(json!({ "status": 200, "comment": plain_comment_json(comment) })))
}

/// Hard delete: the row is removed outright.
pub async fn admin_destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_comment(id)? {
        return Err(ApiError::not_found("Comment"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Comment deleted successfully",
    })))
}

fn entry_from(row: CommentWithAuthorRow) -> CommentEntry {
    CommentEntry {
        id: row.comment.id,
        user_id: row.comment.user_id,
        post_id: row.comment.post_id,
        comment: row.comment.comment,
        reply_cmt_id: row.comment.reply_cmt_id,
        user_name: row.user_name,
        user_pf_img_url: row.user_pf_img_url,
        created_at: parse_ts(&row.comment.created_at),
        updated_at: parse_ts(&row.comment.updated_at),
    }
}

fn authored_json(current: &CurrentUser, row: CommentRow) -> serde_json::Value {
    json!({
        "id": row.id,
        "user_id": row.user_id,
        "user_name": current.user.full_name(),
        "user_pf_img_url": current.user.pf_img_url,
        "comment": row.comment,
        "post_id": row.post_id,
        "reply_cmt_id": row.reply_cmt_id,
        "created_at": parse_ts(&row.created_at),
        "updated_at": parse_ts(&row.updated_at),
    })
}

fn plain_comment_json(row: CommentRow) -> serde_json::Value {
    json!({
        "id": row.id,
        "user_id": row.user_id,
        "post_id": row.post_id,
        "comment": row.comment,
        "reply_cmt_id": row.reply_cmt_id,
        "created_at": parse_ts(&row.created_at),
        "updated_at": parse_ts(&row.updated_at),
    })
}

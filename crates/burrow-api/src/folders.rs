use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use burrow_types::api::{
    FolderFlag, FolderRequest, FolderSummary, PostSummary, SavePostRequest, SavedPreview,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::ts::parse_ts;

const PREVIEW_LIMIT: u32 = 3;

/// The caller's folders, each previewing a few saved posts.
pub async fn index(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.db.folders_for_user(current.id())?;

    let mut folders = Vec::with_capacity(rows.len());
    for folder in rows {
        let saved_posts = state
            .db
            .saved_previews(folder.id, PREVIEW_LIMIT)?
            .into_iter()
            .map(|(id, img_url)| SavedPreview { id, img_url })
            .collect();

        folders.push(FolderSummary {
            id: folder.id,
            title: folder.title,
            saved_posts,
            created_at: parse_ts(&folder.created_at),
            updated_at: parse_ts(&folder.updated_at),
        });
    }

    Ok(Json(json!({ "status": 200, "folders": folders })))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let folder = state
        .db
        .get_folder(id)?
        .filter(|f| f.user_id == current.id())
        .ok_or_else(|| ApiError::not_found("Folder"))?;

    Ok(Json(json!({
        "status": 200,
        "folder": {
            "id": folder.id,
            "user_id": folder.user_id,
            "title": folder.title,
            "description": folder.description,
            "status": folder.status,
            "created_at": parse_ts(&folder.created_at),
            "updated_at": parse_ts(&folder.updated_at),
        },
    })))
}

/// The caller's folders, each flagged with whether the given post is
/// saved in it (drives the save dialog).
pub async fn for_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_post(id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }

    let rows = state.db.folders_for_user(current.id())?;

    let mut folders = Vec::with_capacity(rows.len());
    for folder in rows {
        folders.push(FolderFlag {
            id: folder.id,
            title: folder.title,
            is_saved: state.db.is_saved_in_folder(current.id(), folder.id, id)?,
            created_at: parse_ts(&folder.created_at),
            updated_at: parse_ts(&folder.updated_at),
        });
    }

    Ok(Json(json!({ "status": 200, "folders": folders })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<FolderRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if req.description.as_deref().is_some_and(|d| d.len() > 255) {
        return Err(ApiError::validation("Description is too long"));
    }

    state.db.create_folder(
        current.id(),
        req.title.trim(),
        req.description.as_deref().unwrap_or(""),
        req.status,
    )?;

    Ok(Json(json!({
        "status": 200,
        "message": "Folder created successfully",
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<FolderRequest>,
) -> ApiResult<impl IntoResponse> {
    let folder = state
        .db
        .get_folder(id)?
        .ok_or_else(|| ApiError::not_found("Folder"))?;

    if folder.user_id != current.id() {
        return Err(ApiError::forbidden());
    }

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if req.description.as_deref().is_some_and(|d| d.len() > 255) {
        return Err(ApiError::validation("Description is too long"));
    }

    state.db.update_folder(
        id,
        req.title.trim(),
        req.description.as_deref().unwrap_or(""),
        req.status,
    )?;

    Ok(Json(json!({
        "status": 200,
        "message": "Folder updated successfully",
    })))
}

/// Delete a folder and the saved-post rows inside it.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let folder = state
        .db
        .get_folder(id)?
        .ok_or_else(|| ApiError::not_found("Folder"))?;

    if folder.user_id != current.id() {
        return Err(ApiError::forbidden());
    }

    state.db.delete_folder_cascade(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Folder deleted successfully",
    })))
}

/// Save a post into a set of folders: membership toggles independently
/// per folder (symmetric difference, not an upsert).
pub async fn save_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SavePostRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.folder_id.is_empty() {
        return Err(ApiError::validation("folder_id is required"));
    }

    if state.db.get_post(req.post_id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }

    // Every target folder must exist and belong to the caller before
    // any toggle happens.
    for &folder_id in &req.folder_id {
        let folder = state
            .db
            .get_folder(folder_id)?
            .ok_or_else(|| ApiError::not_found("Folder"))?;
        if folder.user_id != current.id() {
            return Err(ApiError::forbidden());
        }
    }

    state
        .db
        .toggle_saved_post(current.id(), req.post_id, &req.folder_id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Post saved successfully",
    })))
}

/// Posts saved in one of the caller's folders.
pub async fn saved_posts(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let folder = state
        .db
        .get_folder(id)?
        .filter(|f| f.user_id == current.id())
        .ok_or_else(|| ApiError::not_found("Folder"))?;

    let posts: Vec<PostSummary> = state
        .db
        .saved_posts_in_folder(folder.id)?
        .into_iter()
        .map(|row| {
            let full_name = format!("{} {}", row.first_name, row.last_name);
            PostSummary {
                id: row.post.id,
                user_id: row.post.user_id,
                img_url: row.post.img_url,
                is_saved: true,
                first_name: row.first_name,
                last_name: row.last_name,
                full_name,
                user_pf_img_url: row.pf_img_url,
                created_at: parse_ts(&row.post.created_at),
                updated_at: parse_ts(&row.post.updated_at),
            }
        })
        .collect();

    Ok(Json(json!({
        "status": 200,
        "message": "All saved posts",
        "posts": posts,
    })))
}

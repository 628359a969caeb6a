use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::ts::parse_ts;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
}

const USER_LIMIT: u32 = 10;
const GROUP_LIMIT: u32 = 10;
const POST_LIMIT: u32 = 20;

pub async fn users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let term = query.term.unwrap_or_default();
    let users: Vec<serde_json::Value> = state
        .db
        .search_users(&term, USER_LIMIT)?
        .into_iter()
        .map(|u| {
            json!({
                "id": u.id,
                "first_name": u.first_name,
                "last_name": u.last_name,
                "email": u.email,
                "pf_img_url": u.pf_img_url,
                "created_at": parse_ts(&u.created_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "users": users })))
}

pub async fn groups(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let term = query.term.unwrap_or_default();
    let groups: Vec<serde_json::Value> = state
        .db
        .search_groups(&term, GROUP_LIMIT)?
        .into_iter()
        .map(|(g, member_count)| {
            json!({
                "id": g.id,
                "title": g.title,
                "img_url": g.img_url,
                "owner_id": g.owner_id,
                "status": g.status,
                "member_count": member_count,
                "created_at": parse_ts(&g.created_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "groups": groups })))
}

pub async fn posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let term = query.term.unwrap_or_default();
    let posts: Vec<serde_json::Value> = state
        .db
        .search_posts(&term, POST_LIMIT)?
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "user_id": p.user_id,
                "title": p.title,
                "img_url": p.img_url,
                "status": p.status,
                "created_at": parse_ts(&p.created_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

pub async fn random_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users: Vec<serde_json::Value> = state
        .db
        .random_users(USER_LIMIT)?
        .into_iter()
        .map(|u| {
            json!({
                "id": u.id,
                "first_name": u.first_name,
                "last_name": u.last_name,
                "email": u.email,
                "pf_img_url": u.pf_img_url,
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "users": users })))
}

pub async fn random_groups(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let groups: Vec<serde_json::Value> = state
        .db
        .random_groups(GROUP_LIMIT)?
        .into_iter()
        .map(|(g, member_count)| {
            json!({
                "id": g.id,
                "title": g.title,
                "img_url": g.img_url,
                "owner_id": g.owner_id,
                "status": g.status,
                "member_count": member_count,
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "groups": groups })))
}

pub async fn random_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let posts: Vec<serde_json::Value> = state
        .db
        .random_posts(POST_LIMIT)?
        .into_iter()
        .map(|row| {
            json!({
                "id": row.post.id,
                "user_id": row.post.user_id,
                "title": row.post.title,
                "img_url": row.post.img_url,
                "status": row.post.status,
                "first_name": row.first_name,
                "last_name": row.last_name,
                "user_pf_img_url": row.pf_img_url,
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "posts": posts })))
}

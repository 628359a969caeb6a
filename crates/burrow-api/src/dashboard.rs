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
pub struct DashboardQuery {
    pub q: Option<String>,
}

const MONTH_BUCKETS: u32 = 6;

pub async fn total_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let total = state.db.count_users()?;
    let last_week = state.db.count_recent("users")?;

    Ok(Json(json!({
        "status": 200,
        "message": "Total users fetched successfully",
        "data": {
            "total_users": total,
            "last_week_percent": percent(last_week, total),
        },
    })))
}

pub async fn total_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let total = state.db.count_posts()?;
    let last_week = state.db.count_recent("posts")?;

    Ok(Json(json!({
        "status": 200,
        "message": "Total posts fetched successfully",
        "data": {
            "total_posts": total,
            "last_week_percent": percent(last_week, total),
        },
    })))
}

pub async fn total_groups(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let total = state.db.count_groups()?;
    let last_week = state.db.count_recent("groups")?;

    Ok(Json(json!({
        "status": 200,
        "message": "Total groups fetched successfully",
        "data": {
            "total_groups": total,
            "last_week_percent": percent(last_week, total),
        },
    })))
}

pub async fn weekly_new_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (this_week, previous_week) = state.db.weekly_new_users()?;

    Ok(Json(json!({
        "status": 200,
        "message": "Weekly new users fetched successfully",
        "data": {
            "weekly_new_users": this_week,
            "difference": this_week - previous_week,
        },
    })))
}

pub async fn newest_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users: Vec<serde_json::Value> = state
        .db
        .newest_users(10)?
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

    Ok(Json(json!({
        "status": 200,
        "message": "10 newest users fetched successfully",
        "data": users,
    })))
}

/// Monthly post counts for the trailing window, oldest bucket first.
pub async fn posts_last_six_months(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let data = state.db.posts_per_month(MONTH_BUCKETS)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Total posts of last six months fetched successfully",
        "data": data,
    })))
}

/// Non-admin accounts with activity counts.
pub async fn all_users(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<impl IntoResponse> {
    let users: Vec<serde_json::Value> = state
        .db
        .list_users_with_counts(query.q.as_deref())?
        .into_iter()
        .map(|row| {
            json!({
                "id": row.user.id,
                "first_name": row.user.first_name,
                "last_name": row.user.last_name,
                "email": row.user.email,
                "pf_img_url": row.user.pf_img_url,
                "created_at": parse_ts(&row.user.created_at),
                "posts": row.posts,
                "group_own": row.group_own,
                "group_member": row.group_member,
            })
        })
        .collect();

    Ok(Json(json!({
        "status": 200,
        "message": "Users retrieved successfully",
        "data": users,
    })))
}

pub async fn all_admins(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<impl IntoResponse> {
    let admins: Vec<serde_json::Value> = state
        .db
        .list_admins(query.q.as_deref())?
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

    Ok(Json(json!({
        "status": 200,
        "message": "Admins retrieved successfully",
        "data": admins,
    })))
}

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::percent;

    #[test]
    fn percent_handles_empty_tables() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}

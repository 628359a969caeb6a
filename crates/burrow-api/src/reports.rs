use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use burrow_types::api::CreateReportRequest;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::ts::parse_ts;

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.reason.trim().is_empty() {
        return Err(ApiError::validation("A reason is required"));
    }

    if state.db.get_post(req.post_id)?.is_none() {
        return Err(ApiError::not_found("Post"));
    }

    state.db.create_report(current.id(), req.post_id, &req.reason)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Report created successfully",
    })))
}

// -- Admin surface --

/// The moderation queue, annotated with reporter and post owner.
pub async fn admin_index(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let reports: Vec<serde_json::Value> = state
        .db
        .list_reports_annotated()?
        .into_iter()
        .map(|row| {
            json!({
                "id": row.report.id,
                "user_id": row.report.user_id,
                "post_id": row.report.post_id,
                "reason": row.report.reason,
                "reporter_email": row.reporter_email,
                "post_owner_id": row.post_owner_id,
                "post_owner_email": row.post_owner_email,
                "post_img_url": row.post_img_url,
                "created_at": parse_ts(&row.report.created_at),
            })
        })
        .collect();

    Ok(Json(json!({ "status": 200, "reports": reports })))
}

/// Look up a report by the reported post's id.
pub async fn admin_show(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .db
        .get_report_by_post(post_id)?
        .ok_or_else(|| ApiError::not_found("Report"))?;

    Ok(Json(json!({
        "status": 200,
        "report": {
            "id": report.id,
            "user_id": report.user_id,
            "post_id": report.post_id,
            "reason": report.reason,
            "created_at": parse_ts(&report.created_at),
        },
    })))
}

pub async fn admin_destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.delete_report(id)? {
        return Err(ApiError::not_found("Report"));
    }

    Ok(Json(json!({
        "status": 200,
        "message": "Report deleted successfully",
    })))
}

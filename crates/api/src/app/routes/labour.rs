use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Query},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use scrapyard_core::LabourId;
use scrapyard_labour::{AttendanceStatus, MarkAttendance};

use crate::app::routes::common::{parse_id, parse_scope, required};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/all", get(list_labour))
        .route("/attendance/mark", post(mark_attendance))
}

/// Mounted separately under `/api/attendance`.
pub fn attendance_router() -> Router {
    Router::new().route("/by-date", get(attendance_by_date))
}

pub async fn list_labour(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ScopeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let scope = match parse_scope(query.company_id.as_deref(), query.godown_id.as_deref()) {
        Ok(s) => s,
        Err(response) => return response,
    };

    match services.list_labour(scope).await {
        Ok(roster) => {
            let data: Vec<dto::LabourerDto> = roster.iter().map(dto::LabourerDto::from).collect();
            Json(json!({ "success": true, "labour": data })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn mark_attendance(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::MarkAttendanceRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match attendance_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match services.mark_attendance(request).await {
        Ok(record) => Json(json!({
            "success": true,
            "message": "Attendance marked",
            "attendance": dto::AttendanceDto::from(&record),
        }))
        .into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}

fn attendance_request(
    body: dto::MarkAttendanceRequest,
) -> Result<MarkAttendance, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    let labour_id: LabourId = parse_id("labour_id", body.labour_id.as_deref())?;
    let raw_status = required("status", body.status)?;
    let status = AttendanceStatus::parse(&raw_status).ok_or_else(|| {
        errors::json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "validation_error",
            format!("status must be Present or Absent (got {raw_status})"),
        )
    })?;

    Ok(MarkAttendance {
        scope,
        labour_id,
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
        status,
    })
}

pub async fn attendance_by_date(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ScopeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let scope = match parse_scope(query.company_id.as_deref(), query.godown_id.as_deref()) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let date = match required("date", query.date) {
        Ok(d) => d,
        Err(response) => return response,
    };

    match services.attendance_on(scope, date).await {
        Ok(records) => {
            let data: Vec<dto::AttendanceDto> =
                records.iter().map(dto::AttendanceDto::from).collect();
            Json(json!({ "success": true, "attendance": data })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use scrapyard_infra::{BackOfficeError, PurchaseAborted, StoreError, WorkflowError};

const INTERNAL_MESSAGE: &str = "internal server error";

pub fn purchase_aborted_to_response(err: PurchaseAborted) -> axum::response::Response {
    let stage = err.stage.as_str();
    match err.cause {
        WorkflowError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        e @ WorkflowError::EmptyLineSet => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        e @ WorkflowError::VendorNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "vendor_not_found", e.to_string())
        }
        e @ WorkflowError::RateNotFound { .. } => {
            json_error(StatusCode::BAD_REQUEST, "rate_not_found", e.to_string())
        }
        e @ WorkflowError::AccountNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "account_not_found", e.to_string())
        }
        WorkflowError::InvariantViolation(msg) => {
            tracing::error!(stage, error = %msg, "purchase invariant violated");
            internal_error()
        }
        WorkflowError::Storage(e) => {
            tracing::error!(stage, error = %e, "purchase storage failure");
            internal_error()
        }
    }
}

pub fn back_office_error_to_response(err: BackOfficeError) -> axum::response::Response {
    match err {
        BackOfficeError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        e @ BackOfficeError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        BackOfficeError::Storage(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "storage failure");
    internal_error()
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        INTERNAL_MESSAGE,
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use scrapyard_accounting::NewExpense;
use scrapyard_core::{AccountId, Money};

use crate::app::routes::common::{parse_optional_id, parse_scope, required};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/add", post(add_expense))
        .route("/list", get(list_expenses))
        .route("/summary", get(expense_summary))
}

pub async fn add_expense(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddExpenseRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match expense_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match services.add_expense(request).await {
        Ok(expense) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": "Expense added", "expense": expense })),
        )
            .into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}

fn expense_request(body: dto::AddExpenseRequest) -> Result<NewExpense, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    let account_id: Option<AccountId> =
        parse_optional_id("account_id", body.account_id.as_deref())?;

    Ok(NewExpense {
        scope,
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
        category: required("category", body.category)?,
        description: body.description,
        paid_to: body.paid_to,
        payment_mode: body.payment_mode,
        amount: Money::new(required("amount", body.amount)?),
        account_id,
        created_by_name: body.created_by_name,
    })
}

/// Expenses for the day given in `date`, or every day when it is left out.
pub async fn list_expenses(
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

    match services.list_expenses(scope, query.date).await {
        Ok(expenses) => Json(json!({ "success": true, "expenses": expenses })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn expense_summary(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::DateRangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let scope = match parse_scope(query.company_id.as_deref(), query.godown_id.as_deref()) {
        Ok(s) => s,
        Err(response) => return response,
    };
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "start_date must not be after end_date",
            );
        }
    }

    match services
        .expense_summary(scope, query.start_date, query.end_date)
        .await
    {
        Ok(summary) => Json(json!({ "success": true, "summary": summary })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

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

use scrapyard_core::{AccountId, Money, VendorId};
use scrapyard_purchasing::{NewPurchase, PaymentMode, PaymentTerms, Settlement};

use crate::app::routes::common::{parse_id, parse_optional_id, parse_scope};
use crate::app::routes::feriwala::parse_lines;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/add", post(add_kabadiwala))
        .route("/list", get(list_kabadiwala))
        .route("/owner-list", get(owner_list))
}

pub async fn add_kabadiwala(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddKabadiwalaRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match build_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match services.record_purchase(request).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Kabadiwala purchase recorded",
                "kabadi_id": receipt.purchase_id,
                "totalAmount": receipt.total_amount,
                "vendor": receipt.vendor_name,
                "payment_status": receipt.payment_status,
            })),
        )
            .into_response(),
        Err(e) => errors::purchase_aborted_to_response(e),
    }
}

fn build_request(body: dto::AddKabadiwalaRequest) -> Result<NewPurchase, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    let vendor_id: VendorId = parse_id("vendor_id", body.vendor_id.as_deref())?;
    let funding_account: Option<AccountId> =
        parse_optional_id("account_id", body.account_id.as_deref())?;

    let terms = PaymentTerms {
        amount: body.payment_amount.map(Money::new).unwrap_or(Money::ZERO),
        mode: body.payment_mode.map(PaymentMode::new).unwrap_or_default(),
        note: body.note.unwrap_or_default(),
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
    };

    Ok(NewPurchase {
        scope,
        vendor_id,
        lines: parse_lines(body.scraps)?,
        funding_account,
        settlement: Settlement::Deferred(terms),
    })
}

/// Manager view: each purchase with line and payment totals.
pub async fn list_kabadiwala(
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

    match services.list_kabadiwala(scope).await {
        Ok(records) => Json(json!({ "success": true, "kabadiwala": records })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Owner view: one flat row per purchased line.
pub async fn owner_list(
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

    match services.kabadiwala_owner_entries(scope, query.date).await {
        Ok(entries) => Json(json!({ "success": true, "entries": entries })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

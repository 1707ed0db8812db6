use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use scrapyard_core::{AccountId, ScrapTypeId, VendorId, Weight};
use scrapyard_purchasing::{LineRequest, NewPurchase, Settlement};

use crate::app::routes::common::{parse_id, parse_optional_id, parse_scope, required};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/add", post(add_feriwala))
        .route("/list", get(list_feriwala))
}

/// Parse the scrap lines shared by both purchase kinds.
pub fn parse_lines(
    scraps: Option<Vec<dto::ScrapLineRequest>>,
) -> Result<Vec<LineRequest>, axum::response::Response> {
    scraps
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, line)| -> Result<LineRequest, axum::response::Response> {
            let scrap_type_id: ScrapTypeId = parse_id(
                &format!("scraps[{idx}].scrap_type_id"),
                line.scrap_type_id.as_deref(),
            )?;
            let weight = required(&format!("scraps[{idx}].weight"), line.weight)?;
            Ok(LineRequest {
                scrap_type_id,
                weight: Weight::new(weight),
            })
        })
        .collect()
}

pub async fn add_feriwala(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddFeriwalaRequest>, JsonRejection>,
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
                "message": "Feriwala purchase recorded",
                "feriwala_id": receipt.purchase_id,
                "totalAmount": receipt.total_amount,
                "vendor": receipt.vendor_name,
            })),
        )
            .into_response(),
        Err(e) => errors::purchase_aborted_to_response(e),
    }
}

fn build_request(body: dto::AddFeriwalaRequest) -> Result<NewPurchase, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    let vendor_id: VendorId = parse_id("vendor_id", body.vendor_id.as_deref())?;
    let funding_account: Option<AccountId> =
        parse_optional_id("account_id", body.account_id.as_deref())?;

    Ok(NewPurchase {
        scope,
        vendor_id,
        lines: parse_lines(body.scraps)?,
        funding_account,
        settlement: Settlement::FullPayment,
    })
}

pub async fn list_feriwala(
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

    match services.list_feriwala(scope, query.date).await {
        Ok(records) => Json(json!({ "success": true, "records": records })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

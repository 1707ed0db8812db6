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

use scrapyard_core::{Money, Rate, Weight};
use scrapyard_sales::{NewSale, NewSalePayment};

use crate::app::routes::common::{parse_scope, required};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/add-sale", post(add_sale))
        .route("/list-sales", get(list_sales))
        .route("/add-payment", post(add_payment))
        .route("/list-payments", get(list_payments))
}

pub async fn add_sale(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddSaleRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match sale_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match services.add_sale(request).await {
        Ok(sale) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": "Sale added", "sale": sale })),
        )
            .into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}

fn sale_request(body: dto::AddSaleRequest) -> Result<NewSale, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    Ok(NewSale {
        scope,
        firm_name: required("firm_name", body.firm_name)?,
        bill_to: body.bill_to,
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
        weight: Weight::new(required("weight", body.weight)?),
        rate: Rate::new(required("rate", body.rate)?),
        gst: body.gst,
        freight: body.freight.map(Money::new),
        vehicle_no: body.vehicle_no,
        payment_type: body.payment_type,
    })
}

pub async fn add_payment(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddSalePaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match payment_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match services.add_sale_payment(request).await {
        Ok(payment) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": "Payment added", "payment": payment })),
        )
            .into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}

fn payment_request(
    body: dto::AddSalePaymentRequest,
) -> Result<NewSalePayment, axum::response::Response> {
    let scope = parse_scope(body.company_id.as_deref(), body.godown_id.as_deref())?;
    Ok(NewSalePayment {
        scope,
        firm_name: required("firm_name", body.firm_name)?,
        amount: Money::new(required("amount", body.amount)?),
        date: body.date.unwrap_or_else(|| Utc::now().date_naive()),
    })
}

pub async fn list_sales(
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

    match services.list_sales(scope, query.date).await {
        Ok(sales) => Json(json!({ "success": true, "sales": sales })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_payments(
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

    match services.list_sale_payments(scope, query.date).await {
        Ok(payments) => Json(json!({ "success": true, "payments": payments })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

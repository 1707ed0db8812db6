use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::Response;

use scrapyard_core::{CompanyId, GodownId, Scope};

use crate::app::errors;

/// Parse a required identifier field.
pub fn parse_id<T: FromStr>(field: &str, raw: Option<&str>) -> Result<T, Response> {
    match parse_optional_id(field, raw)? {
        Some(id) => Ok(id),
        None => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{field} is required"),
        )),
    }
}

/// Parse an identifier field that may be absent; blank counts as absent.
pub fn parse_optional_id<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, Response> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                format!("invalid {field}"),
            )
        }),
    }
}

pub fn parse_scope(company_id: Option<&str>, godown_id: Option<&str>) -> Result<Scope, Response> {
    let company_id: CompanyId = parse_id("company_id", company_id)?;
    let godown_id: GodownId = parse_id("godown_id", godown_id)?;
    Ok(Scope::new(company_id, godown_id))
}

pub fn required<T>(field: &str, value: Option<T>) -> Result<T, Response> {
    value.ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{field} is required"),
        )
    })
}

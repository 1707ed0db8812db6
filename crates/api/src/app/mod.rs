//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and workflow wiring for the configured backend
//! - `routes/`: handlers, one file per area of the back office
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))))
}

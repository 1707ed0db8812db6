use axum::Router;

pub mod common;
pub mod expenses;
pub mod feriwala;
pub mod kabadiwala;
pub mod labour;
pub mod maal_out;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/feriwala", feriwala::router())
        .nest("/kabadiwala", kabadiwala::router())
        .nest("/maal-out", maal_out::router())
        .nest("/labour", labour::router())
        .nest("/attendance", labour::attendance_router())
        .nest("/expenses", expenses::router())
}

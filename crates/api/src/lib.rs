//! HTTP API for the scrap yard back office: server wiring, routing, and
//! request/response mapping.

pub mod app;
pub mod config;

//! HTTP API layer for denuncia.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: complaints, comments and categories as POST + JSON routes
//! - **Extractors**: authenticated account and client address
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{healthz, router};
pub use middleware::AppState;

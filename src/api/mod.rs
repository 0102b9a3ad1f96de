//! # REST API
//!
//! Axum router, handlers, and error mapping for the storefront auth surface.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;

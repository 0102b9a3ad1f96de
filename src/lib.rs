//! # Storefront
//!
//! Token authentication and multi-device sessions for a storefront backend.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → Auth middleware → Auth / Session services → SQLite stores
//!                          ↓                    ↓
//!                    Token codec (JWT)    Activation mail dispatch
//! ```
//!
//! Every login or refresh issues an access/refresh pair bound to the caller's
//! `User-Agent`. One session exists per user and device; refreshing rotates
//! its stored token so an older refresh token stops working.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod startup;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

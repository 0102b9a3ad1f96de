//! # Error Handling
//!
//! Crate-wide error type. Authentication outcomes have their own taxonomy in
//! [`crate::auth::models::AuthError`]; everything underneath it (storage,
//! configuration, signing) is a [`StorefrontError`].

mod types;

pub use types::{Result, StorefrontError};

/// Short alias used throughout the crate
pub type Error = StorefrontError;

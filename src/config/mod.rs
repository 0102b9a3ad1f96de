//! # Configuration Management
//!
//! Configuration is read once at startup into an [`AppConfig`] value which is
//! then handed to the components that need it.

mod settings;

pub use settings::{
    AppConfig, AuthConfig, DatabaseConfig, ObservabilityConfig, ServerConfig, MIN_SECRET_LENGTH,
};

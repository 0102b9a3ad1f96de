//! # Structured Logging
//!
//! `tracing-subscriber` setup for the service binary.
//! `RUST_LOG` takes precedence over the configured log level.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Result, StorefrontError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            StorefrontError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| {
        StorefrontError::config_with_source("Failed to install tracing subscriber", Box::new(e))
    })
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_in_memory = config.database.is_in_memory(),
        auto_migrate = config.database.auto_migrate,
        metrics_enabled = config.observability.enable_metrics,
        access_token_ttl_minutes = config.auth.access_token_ttl_minutes,
        refresh_token_ttl_days = config.auth.refresh_token_ttl_days,
        secure_cookies = config.auth.secure_cookies,
        "Storefront configuration"
    );
}

//! # Configuration Settings
//!
//! Defines the configuration structure for the storefront backend.

use crate::errors::{Result, StorefrontError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Minimum accepted length for either token signing secret.
pub const MIN_SECRET_LENGTH: usize = 32;

pub const ENV_ACCESS_TOKEN_SECRET: &str = "STOREFRONT_ACCESS_TOKEN_SECRET";
pub const ENV_REFRESH_TOKEN_SECRET: &str = "STOREFRONT_REFRESH_TOKEN_SECRET";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Token and session configuration
    #[validate(nested)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load every section from the environment and validate the result.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
            auth: AuthConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(StorefrontError::from)?;
        self.validate_custom()
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.observability.metrics_port != 0 && self.server.port == self.observability.metrics_port
        {
            return Err(StorefrontError::validation("Server and metrics ports cannot be the same"));
        }

        if !self.database.is_sqlite() {
            return Err(StorefrontError::validation("Database URL must start with 'sqlite:'"));
        }

        self.auth.validate_secrets()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, timeout_seconds: 30 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Create ServerConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("STOREFRONT_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("STOREFRONT_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|e| StorefrontError::config(format!("Invalid server port: {}", e)))?,
            Err(_) => defaults.port,
        };

        let timeout_seconds = std::env::var("STOREFRONT_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.timeout_seconds);

        Ok(Self { host, port, timeout_seconds })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/storefront.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// In-memory databases live and die with a single connection
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let url = std::env::var("DATABASE_URL").unwrap_or(defaults.url);

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_connections);

        let min_connections = std::env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.min_connections);

        let connect_timeout_seconds = std::env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.connect_timeout_seconds);

        let idle_timeout_seconds = std::env::var("DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.idle_timeout_seconds);

        let auto_migrate = std::env::var("DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.auto_migrate);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "storefront".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
            metrics_port: 0,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }

    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level = std::env::var("STOREFRONT_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("STOREFRONT_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        let metrics_port = std::env::var("STOREFRONT_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.metrics_port);

        Self {
            service_name: defaults.service_name,
            log_level,
            json_logging,
            enable_metrics: metrics_port != 0,
            metrics_port,
        }
    }
}

/// Token signing and session configuration.
///
/// Loaded once at startup and passed down by value; nothing reads these
/// settings from process-wide state.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    #[validate(length(min = 1, message = "Access token secret cannot be empty"))]
    pub access_token_secret: String,

    /// HMAC secret for refresh tokens, must differ from the access secret
    #[validate(length(min = 1, message = "Refresh token secret cannot be empty"))]
    pub refresh_token_secret: String,

    /// Access token lifetime in minutes
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Access token TTL must be between 1 minute and 24 hours"
    ))]
    pub access_token_ttl_minutes: i64,

    /// Refresh token lifetime in whole days
    #[validate(range(
        min = 1,
        max = 365,
        message = "Refresh token TTL must be between 1 and 365 days"
    ))]
    pub refresh_token_ttl_days: i64,

    /// Set the `Secure` attribute on token cookies
    pub secure_cookies: bool,

    /// Role granted to every newly registered user
    #[validate(length(min = 1, message = "Default role cannot be empty"))]
    pub default_role: String,

    /// Base URL the activation link is appended to in activation emails
    #[validate(length(min = 1, message = "Activation base URL cannot be empty"))]
    pub activation_base_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"***")
            .field("refresh_token_secret", &"***")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("secure_cookies", &self.secure_cookies)
            .field("default_role", &self.default_role)
            .field("activation_base_url", &self.activation_base_url)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "storefront-access-secret-please-change-in-production".to_string(),
            refresh_token_secret: "storefront-refresh-secret-please-change-in-production"
                .to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 30,
            secure_cookies: true,
            default_role: "USER".to_string(),
            activation_base_url: "http://localhost:8080/api/v1/auth/activate".to_string(),
        }
    }
}

impl AuthConfig {
    /// Access token lifetime as a chrono duration
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_ttl_minutes)
    }

    /// Refresh token lifetime as a chrono duration
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_ttl_days)
    }

    /// Secret length and separation rules
    pub fn validate_secrets(&self) -> Result<()> {
        if self.access_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(StorefrontError::validation_field(
                format!("Access token secret must be at least {} characters long", MIN_SECRET_LENGTH),
                "access_token_secret",
            ));
        }

        if self.refresh_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(StorefrontError::validation_field(
                format!(
                    "Refresh token secret must be at least {} characters long",
                    MIN_SECRET_LENGTH
                ),
                "refresh_token_secret",
            ));
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(StorefrontError::validation(
                "Access and refresh token secrets must be different",
            ));
        }

        Ok(())
    }

    /// Create AuthConfig from environment variables.
    ///
    /// Both signing secrets must be set; the `Default` secrets are for tests only.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let access_token_secret = required_secret(ENV_ACCESS_TOKEN_SECRET)?;
        let refresh_token_secret = required_secret(ENV_REFRESH_TOKEN_SECRET)?;

        let access_token_ttl_minutes = match std::env::var("STOREFRONT_ACCESS_TOKEN_TTL_MINUTES") {
            Ok(value) => value.parse().map_err(|e| {
                StorefrontError::config(format!("Invalid access token TTL: {}", e))
            })?,
            Err(_) => defaults.access_token_ttl_minutes,
        };

        let refresh_token_ttl_days = match std::env::var("STOREFRONT_REFRESH_TOKEN_TTL_DAYS") {
            Ok(value) => value.parse().map_err(|e| {
                StorefrontError::config(format!("Invalid refresh token TTL: {}", e))
            })?,
            Err(_) => defaults.refresh_token_ttl_days,
        };

        let secure_cookies = std::env::var("STOREFRONT_SECURE_COOKIES")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.secure_cookies);

        let default_role =
            std::env::var("STOREFRONT_DEFAULT_ROLE").unwrap_or(defaults.default_role);

        let activation_base_url = std::env::var("STOREFRONT_ACTIVATION_BASE_URL")
            .unwrap_or(defaults.activation_base_url);

        Ok(Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            secure_cookies,
            default_role,
            activation_base_url,
        })
    }
}

fn required_secret(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StorefrontError::config(format!("{} must be set", name))),
    }
}

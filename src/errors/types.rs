//! # Error Types
//!
//! Error types for the storefront backend using `thiserror`.

/// Custom result type for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Main error type for the storefront backend
#[derive(thiserror::Error, Debug)]
pub enum StorefrontError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Transport errors (HTTP listener, metrics exporter)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },
}

impl StorefrontError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create an internal server error that keeps its cause
    pub fn internal_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Wrap a sqlx error with the operation that failed
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// True when the error is a unique/foreign-key constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StorefrontError::Database { source, .. } => source
                .as_database_error()
                .map(|db_err| {
                    db_err.is_unique_violation()
                        || db_err.is_foreign_key_violation()
                        || db_err.is_check_violation()
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StorefrontError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>();
        // HashMap iteration order is unstable; keep messages deterministic.
        fields.sort();

        Self::validation(format!("Validation failed: {}", fields.join("; ")))
    }
}

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::models::AuthError;
use crate::errors::StorefrontError;

/// Message shared by every unauthorized outcome so callers cannot tell which
/// check failed.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn internal() -> Self {
        ApiError::Internal("internal server error".to_string())
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let (error_kind, message) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::Conflict(msg) => ("conflict", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::Unauthorized(msg) => ("unauthorized", msg),
            ApiError::Forbidden(msg) => ("forbidden", msg),
            ApiError::Internal(msg) => ("internal_error", msg),
        };

        (status, Json(ErrorBody { error: error_kind, message })).into_response()
    }
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Validation { message, .. } => ApiError::BadRequest(message),
            StorefrontError::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", resource_type))
            }
            other => {
                // Storage and internal details stay in the logs
                tracing::error!(error = %other, "request failed with internal error");
                ApiError::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingBearer
            | AuthError::MalformedBearer
            | AuthError::TokenInvalid
            | AuthError::DeviceMismatch
            | AuthError::SessionNotFound
            | AuthError::UserNotFound => ApiError::unauthorized(),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserAlreadyRegistered => ApiError::Conflict(err.to_string()),
            AuthError::Validation(message) => ApiError::BadRequest(message),
            AuthError::InsufficientRole => ApiError::Forbidden("forbidden".to_string()),
            AuthError::Internal(inner) => ApiError::from(inner),
        }
    }
}

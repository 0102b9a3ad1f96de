//! Data models for users, roles, tokens, and device sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::{RoleId, SessionId, UserId};
use crate::errors::StorefrontError;

/// A named role. Titles are unique ignoring case and stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
}

impl Role {
    pub fn normalize_title(title: &str) -> String {
        title.trim().to_uppercase()
    }

    pub fn matches(&self, title: &str) -> bool {
        self.title.eq_ignore_ascii_case(title.trim())
    }
}

/// User record as held by the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_activated: bool,
    pub activation_link: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Normalize email to lowercase for consistent storage and comparison.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn role_titles(&self) -> Vec<String> {
        self.roles.iter().map(|role| role.title.clone()).collect()
    }
}

/// New user creation payload. The store assigns the default role.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub activation_link: String,
}

/// Which secret and expiry policy a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity embedded in both token kinds. The user agent is captured when the
/// pair is signed and compared again on every verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub user_id: UserId,
    pub user_agent: String,
}

impl UserClaims {
    pub fn new(user_id: UserId, user_agent: impl Into<String>) -> Self {
        Self { user_id, user_agent: user_agent.into() }
    }
}

/// Freshly signed access/refresh pair.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

/// Persisted session: the refresh token currently valid for one device.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub user_agent: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session listing entry shown to the owner. Never carries the token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_current: bool,
}

/// Request-scoped identity materialized by the auth gate.
#[derive(Debug, Clone)]
pub struct LocalSession {
    pub user_id: UserId,
    pub user_agent: String,
    pub roles: Vec<String>,
}

impl LocalSession {
    pub fn has_role(&self, title: &str) -> bool {
        self.roles.iter().any(|role| role.eq_ignore_ascii_case(title.trim()))
    }
}

/// Errors returned by the authentication services and middleware.
///
/// Every unauthorized variant renders the same response body; the variants
/// exist for logging and metrics only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized: bearer token missing")]
    MissingBearer,
    #[error("unauthorized: malformed bearer token")]
    MalformedBearer,
    #[error("unauthorized: token invalid")]
    TokenInvalid,
    #[error("unauthorized: device mismatch")]
    DeviceMismatch,
    #[error("unauthorized: session not found")]
    SessionNotFound,
    #[error("unauthorized: user not found")]
    UserNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user already registered")]
    UserAlreadyRegistered,
    #[error("{0}")]
    Validation(String),
    #[error("forbidden: insufficient role")]
    InsufficientRole,
    #[error(transparent)]
    Internal(#[from] StorefrontError),
}

impl AuthError {
    /// Label used for the `auth_authentications_total` counter.
    pub fn metric_label(&self) -> &'static str {
        match self {
            AuthError::MissingBearer => "missing_bearer",
            AuthError::MalformedBearer => "malformed",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::DeviceMismatch => "device_mismatch",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserAlreadyRegistered => "already_registered",
            AuthError::Validation(_) => "validation",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::Internal(_) => "error",
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        match StorefrontError::from(errors) {
            StorefrontError::Validation { message, .. } => AuthError::Validation(message),
            other => AuthError::Internal(other),
        }
    }
}

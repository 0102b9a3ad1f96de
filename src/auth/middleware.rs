//! Axum middleware for authentication and role authorization.
//!
//! `authenticate` turns a bearer access token into a [`LocalSession`] stored in
//! the request extensions. `ensure_roles` runs after it on routes that need
//! specific roles.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        HeaderMap, Method, Request,
    },
    middleware::Next,
    response::Response,
};
use tracing::{field, info_span, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::authorization::RoleRequirement;
use crate::auth::models::{AuthError, LocalSession, TokenKind};
use crate::auth::session::SessionService;
use crate::observability::metrics;
use crate::storage::repositories::UserRepository;

pub type AuthGateState = Arc<AuthGate>;
pub type RoleState = Arc<RoleRequirement>;

/// Verifies access tokens against the signing secret, the caller's device, and the user store.
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<SessionService>,
    users: Arc<dyn UserRepository>,
}

impl AuthGate {
    pub fn new(sessions: Arc<SessionService>, users: Arc<dyn UserRepository>) -> Self {
        Self { sessions, users }
    }

    /// Extract the token from `Bearer <token>`. Anything but exactly two parts is malformed.
    pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
        let header = header.map(str::trim).unwrap_or_default();
        if header.is_empty() {
            return Err(AuthError::MissingBearer);
        }

        let mut parts = header.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Ok(token),
            _ => Err(AuthError::MalformedBearer),
        }
    }

    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        user_agent: &str,
    ) -> Result<LocalSession, AuthError> {
        let token = Self::parse_bearer(authorization)?;
        let claims = self.sessions.parse(token, TokenKind::Access)?;

        if claims.user_agent != user_agent {
            return Err(AuthError::DeviceMismatch);
        }

        let user = self.users.find_by_id(&claims.user_id).await?.ok_or(AuthError::UserNotFound)?;

        Ok(LocalSession { roles: user.role_titles(), user_id: user.id, user_agent: claims.user_agent })
    }
}

/// Device identity of a request. A missing or non-UTF-8 header is the empty string.
pub fn request_user_agent(headers: &HeaderMap) -> &str {
    headers.get(USER_AGENT).and_then(|value| value.to_str().ok()).unwrap_or_default()
}

/// Middleware entry point that authenticates requests using the configured [`AuthGate`].
pub async fn authenticate(
    State(gate): State<AuthGateState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        auth.user_id = field::Empty,
        correlation_id = %correlation_id
    );

    let authorization =
        request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let user_agent = request_user_agent(request.headers());

    match gate.authenticate(authorization, user_agent).instrument(span.clone()).await {
        Ok(session) => {
            span.record("auth.user_id", field::display(&session.user_id));
            metrics::record_authentication("success").await;
            request.extensions_mut().insert(session);
            Ok(next.run(request).instrument(span).await)
        }
        Err(err) => {
            span.in_scope(|| {
                warn!(%correlation_id, reason = err.metric_label(), "authentication failed")
            });
            metrics::record_authentication(err.metric_label()).await;
            Err(ApiError::from(err))
        }
    }
}

/// Middleware entry point that verifies the caller holds the required roles.
pub async fn ensure_roles(
    State(requirement): State<RoleState>,
    Extension(session): Extension<LocalSession>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if requirement.is_satisfied_by(&session) {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    warn!(
        %correlation_id,
        http.method = %request.method(),
        http.path = %request.uri().path(),
        user_id = %session.user_id,
        required = %requirement.titles().join(" "),
        granted = %session.roles.join(" "),
        "role check failed"
    );
    metrics::record_authentication(AuthError::InsufficientRole.metric_label()).await;
    Err(ApiError::from(AuthError::InsufficientRole))
}

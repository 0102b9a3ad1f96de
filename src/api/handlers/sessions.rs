//! Session management for the authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::models::{LocalSession, SessionSummary};
use crate::domain::SessionId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokedSessionsResponse {
    pub revoked: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "Sessions of the caller, most recently used first", body = [SessionSummary]),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn list_sessions_handler(
    State(state): State<ApiState>,
    Extension(session): Extension<LocalSession>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions =
        state.auth.sessions().list_sessions(&session.user_id, &session.user_agent).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "Every session of the caller revoked", body = RevokedSessionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn revoke_all_sessions_handler(
    State(state): State<ApiState>,
    Extension(session): Extension<LocalSession>,
) -> Result<Json<RevokedSessionsResponse>, ApiError> {
    let revoked = state.auth.sessions().remove_all(&session.user_id).await?;
    Ok(Json(RevokedSessionsResponse { revoked }))
}

/// Revokes every session except the one held by the calling device. When the
/// calling device has no stored session, all sessions go.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/others",
    responses(
        (status = 200, description = "Other sessions revoked", body = RevokedSessionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn revoke_other_sessions_handler(
    State(state): State<ApiState>,
    Extension(session): Extension<LocalSession>,
) -> Result<Json<RevokedSessionsResponse>, ApiError> {
    let sessions = state.auth.sessions();
    let revoked = match sessions.find_current(&session.user_id, &session.user_agent).await? {
        Some(current) => sessions.remove_all_except_current(&session.user_id, &current.id).await?,
        None => sessions.remove_all(&session.user_id).await?,
    };
    Ok(Json(RevokedSessionsResponse { revoked }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "No such session for the caller", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn revoke_session_handler(
    State(state): State<ApiState>,
    Extension(session): Extension<LocalSession>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = SessionId::parse(&id).map_err(|_| ApiError::not_found("Session not found"))?;

    if state.auth.sessions().remove_session(&session.user_id, &session_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session not found"))
    }
}

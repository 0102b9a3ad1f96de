//! Administrative session revocation. Routed behind an `ADMIN` role requirement.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::info;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::handlers::sessions::RevokedSessionsResponse;
use crate::api::routes::ApiState;
use crate::auth::models::{LocalSession, SessionSummary};
use crate::domain::UserId;

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    UserId::parse(id).map_err(|_| ApiError::not_found("User not found"))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}/sessions",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Sessions of the user", body = [SessionSummary]),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorBody),
        (status = 404, description = "Malformed user ID", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "admin"
)]
pub async fn list_user_sessions_handler(
    State(state): State<ApiState>,
    Extension(admin): Extension<LocalSession>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let mut sessions = state.auth.sessions().list_sessions(&user_id, &admin.user_agent).await?;

    // The admin's device only marks a session current on the admin's own account
    if user_id != admin.user_id {
        sessions.iter_mut().for_each(|session| session.is_current = false);
    }

    Ok(Json(sessions))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}/sessions",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Every session of the user revoked", body = RevokedSessionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorBody),
        (status = 404, description = "Malformed user ID", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "admin"
)]
pub async fn revoke_user_sessions_handler(
    State(state): State<ApiState>,
    Extension(admin): Extension<LocalSession>,
    Path(id): Path<String>,
) -> Result<Json<RevokedSessionsResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let revoked = state.auth.sessions().remove_all(&user_id).await?;

    info!(admin_id = %admin.user_id, user_id = %user_id, revoked, "admin revoked user sessions");
    Ok(Json(RevokedSessionsResponse { revoked }))
}

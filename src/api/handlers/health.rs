//! Liveness endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::routes::ApiState;
use crate::storage::check_connection;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the database answers, "degraded" otherwise
    #[schema(example = "ok")]
    pub status: String,
}

/// Returns 200 while the database is reachable and 503 when it is not.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    match check_connection(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok".to_string() })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "degraded".to_string() }))
        }
    }
}

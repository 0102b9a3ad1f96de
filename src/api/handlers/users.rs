use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::models::{LocalSession, User};
use crate::domain::UserId;

/// Public view of the authenticated user. No password hash, no activation link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: UserId,
    pub email: String,
    pub is_activated: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        let roles = user.role_titles();
        Self {
            id: user.id,
            email: user.email,
            is_activated: user.is_activated,
            roles,
            created_at: user.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn current_user_handler(
    State(state): State<ApiState>,
    Extension(session): Extension<LocalSession>,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = state.auth.current_user(&session.user_id).await?;
    Ok(Json(user.into()))
}

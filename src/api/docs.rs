use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::registration_handler,
        crate::api::handlers::auth::login_handler,
        crate::api::handlers::auth::refresh_handler,
        crate::api::handlers::auth::logout_handler,
        crate::api::handlers::auth::activate_handler,
        crate::api::handlers::users::current_user_handler,
        crate::api::handlers::sessions::list_sessions_handler,
        crate::api::handlers::sessions::revoke_all_sessions_handler,
        crate::api::handlers::sessions::revoke_other_sessions_handler,
        crate::api::handlers::sessions::revoke_session_handler,
        crate::api::handlers::admin::list_user_sessions_handler,
        crate::api::handlers::admin::revoke_user_sessions_handler
    ),
    components(
        schemas(
            crate::api::error::ErrorBody,
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::auth::RegistrationResponse,
            crate::api::handlers::auth::TokenResponse,
            crate::api::handlers::users::CurrentUserResponse,
            crate::api::handlers::sessions::RevokedSessionsResponse,
            crate::auth::validation::RegisterRequest,
            crate::auth::validation::LoginRequest,
            crate::auth::models::SessionSummary,
            crate::domain::UserId,
            crate::domain::SessionId
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, and token refresh"),
        (name = "users", description = "Current user"),
        (name = "sessions", description = "Per-device session management"),
        (name = "admin", description = "Administrative session revocation"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

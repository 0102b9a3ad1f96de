use std::{sync::Arc, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{
    auth_service::AuthService,
    authorization::RoleRequirement,
    middleware::{authenticate, ensure_roles, AuthGate, RoleState},
};
use crate::storage::DbPool;

use super::{
    docs::openapi_handler,
    handlers::{
        activate_handler, current_user_handler, health_handler, list_sessions_handler,
        list_user_sessions_handler, login_handler, logout_handler, refresh_handler,
        registration_handler, revoke_all_sessions_handler, revoke_other_sessions_handler,
        revoke_session_handler, revoke_user_sessions_handler,
    },
};

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub gate: Arc<AuthGate>,
    pub pool: DbPool,
    pub secure_cookies: bool,
    /// Requests still running after this are answered 408 and their handler dropped
    pub request_timeout: Duration,
}

pub fn build_router(state: ApiState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.gate.clone(), authenticate);

    let role_layer = |titles: &[&str]| {
        let required: RoleState = Arc::new(RoleRequirement::all(titles.iter().copied()));
        middleware::from_fn_with_state(required, ensure_roles)
    };

    let admin_api = Router::new()
        .route(
            "/api/v1/admin/users/{id}/sessions",
            get(list_user_sessions_handler).delete(revoke_user_sessions_handler),
        )
        .route_layer(role_layer(&["ADMIN"]));

    // Added last so it wraps the role layers and runs before them
    let secured_api = Router::new()
        .route("/api/v1/users/me", get(current_user_handler))
        .route("/api/v1/sessions", get(list_sessions_handler).delete(revoke_all_sessions_handler))
        .route("/api/v1/sessions/others", delete(revoke_other_sessions_handler))
        .route("/api/v1/sessions/{id}", delete(revoke_session_handler))
        .merge(admin_api)
        .route_layer(auth_layer);

    let public_api = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/openapi.json", get(openapi_handler))
        .route("/api/v1/auth/registration", post(registration_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/refresh", post(refresh_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/auth/activate/{link}", get(activate_handler));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let request_timeout = state.request_timeout;

    Router::new()
        .merge(public_api)
        .merge(secured_api)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::{
    middleware::request_user_agent,
    models::AuthResponse,
    validation::{LoginRequest, RegisterRequest},
};
use crate::domain::UserId;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub user_id: UserId,
}

/// Body of a login or refresh response. The refresh token travels only in its
/// HttpOnly cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub user_id: UserId,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&AuthResponse> for TokenResponse {
    fn from(response: &AuthResponse) -> Self {
        Self {
            user_id: response.user_id.clone(),
            access_token: response.tokens.access_token.clone(),
            access_token_expires_at: response.tokens.access_expires_at,
            refresh_token_expires_at: response.tokens.refresh_expires_at,
        }
    }
}

fn token_cookie(
    name: &'static str,
    value: String,
    expires_at: DateTime<Utc>,
    http_only: bool,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok())
        .into()
}

/// Empty cookie that tells the browser to drop `name` right away.
fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .into()
}

fn with_token_cookies(jar: CookieJar, response: &AuthResponse, secure: bool) -> CookieJar {
    let tokens = &response.tokens;
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        tokens.access_expires_at,
        false,
        secure,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        tokens.refresh_expires_at,
        true,
        secure,
    ))
}

fn refresh_cookie_value(jar: &CookieJar) -> Result<String, ApiError> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(ApiError::unauthorized)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/registration",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, activation email queued", body = RegistrationResponse),
        (status = 400, description = "Invalid email or password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn registration_handler(
    State(state): State<ApiState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let user_id = state.auth.registration(payload).await?;
    Ok((StatusCode::CREATED, Json(RegistrationResponse { user_id })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse,
         headers(("Set-Cookie" = String, description = "access_token and refresh_token cookies"))),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let user_agent = request_user_agent(&headers);
    let response = state.auth.login(&payload, user_agent).await?;

    let body = TokenResponse::from(&response);
    Ok((with_token_cookies(jar, &response, state.secure_cookies), Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "Token pair rotated", body = TokenResponse,
         headers(("Set-Cookie" = String, description = "access_token and refresh_token cookies"))),
        (status = 401, description = "Refresh token missing, invalid, or replayed", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let refresh_token = refresh_cookie_value(&jar)?;
    let user_agent = request_user_agent(&headers);
    let response = state.auth.refresh(&refresh_token, user_agent).await?;

    let body = TokenResponse::from(&response);
    Ok((with_token_cookies(jar, &response, state.secure_cookies), Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Session removed and cookies cleared"),
        (status = 401, description = "No refresh cookie", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let refresh_token = refresh_cookie_value(&jar)?;
    state.auth.logout(&refresh_token).await?;

    let jar = jar.add(expired_cookie(ACCESS_TOKEN_COOKIE)).add(expired_cookie(REFRESH_TOKEN_COOKIE));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/activate/{link}",
    params(("link" = String, Path, description = "Activation link from the registration email")),
    responses(
        (status = 204, description = "Account activated"),
        (status = 404, description = "Unknown activation link", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn activate_handler(
    State(state): State<ApiState>,
    Path(link): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.auth.activate(&link).await?;
    Ok(StatusCode::NO_CONTENT)
}

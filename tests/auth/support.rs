#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use axum_extra::extract::cookie::Cookie;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use storefront::{
    api::{build_router, ApiState},
    auth::{ActivationMailer, MailDispatcher},
    config::{AppConfig, DatabaseConfig},
    domain::UserId,
    startup::build_services,
    storage::{create_pool, DbPool, UserRepository},
};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse";
pub const DEVICE_A: &str = "Mozilla/5.0 (Device A)";
pub const DEVICE_B: &str = "Mozilla/5.0 (Device B)";

/// Captures activation emails instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ActivationMailer for RecordingMailer {
    async fn send_activation_email(&self, to: &str, activation_url: &str) -> storefront::Result<()> {
        self.sent.lock().expect("mailer lock").push((to.to_string(), activation_url.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    state: ApiState,
    pub pool: DbPool,
    pub users: Arc<dyn UserRepository>,
    pub mail: MailDispatcher,
    pub mailer: Arc<RecordingMailer>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Like [`setup_test_app`] with a chance to adjust the config first.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            auto_migrate: true,
            ..Default::default()
        },
        ..Default::default()
    };
    config.auth.secure_cookies = false;
    config.auth.activation_base_url = "https://shop.test/activate".to_string();
    configure(&mut config);

    let pool = create_pool(&config.database).await.expect("create sqlite pool");
    let mailer = Arc::new(RecordingMailer::default());
    let services = build_services(&config, pool.clone(), mailer.clone());

    TestApp {
        state: services.api_state,
        pool,
        users: services.users,
        mail: services.mail,
        mailer,
        config,
    }
}

/// Request options beyond method and path.
#[derive(Default)]
pub struct Req<'a> {
    pub bearer: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub refresh_cookie: Option<&'a str>,
    pub body: Option<Value>,
}

pub async fn send_request(app: &TestApp, method: Method, path: &str, req: Req<'_>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = req.bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(user_agent) = req.user_agent {
        builder = builder.header(header::USER_AGENT, user_agent);
    }
    if let Some(refresh) = req.refresh_cookie {
        builder = builder.header(header::COOKIE, format!("refresh_token={}", refresh));
    }

    let request = if let Some(json) = req.body {
        let bytes = serde_json::to_vec(&json).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("build request")
    } else {
        builder.body(Body::empty()).expect("build request")
    };

    app.router().oneshot(request).await.expect("request")
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// Find a cookie set by the response.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .find(|cookie| cookie.name() == name)
}

/// Tokens handed out by a login or refresh.
#[derive(Debug, Clone)]
pub struct Issued {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register(app: &TestApp, email: &str) -> UserId {
    let response = send_request(
        app,
        Method::POST,
        "/api/v1/auth/registration",
        Req { body: Some(json!({ "email": email, "password": PASSWORD })), ..Default::default() },
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = read_json(response).await;
    UserId::from_str_unchecked(body["userId"].as_str().expect("userId"))
}

pub async fn login_response(
    app: &TestApp,
    email: &str,
    password: &str,
    device: &str,
) -> Response<Body> {
    send_request(
        app,
        Method::POST,
        "/api/v1/auth/login",
        Req {
            user_agent: Some(device),
            body: Some(json!({ "email": email, "password": password })),
            ..Default::default()
        },
    )
    .await
}

pub async fn issued_from(response: Response<Body>) -> Issued {
    assert_eq!(response.status(), StatusCode::OK);
    let refresh_token =
        set_cookie(&response, "refresh_token").expect("refresh cookie").value().to_string();
    let body: Value = read_json(response).await;

    Issued {
        user_id: body["userId"].as_str().expect("userId").to_string(),
        access_token: body["accessToken"].as_str().expect("accessToken").to_string(),
        refresh_token,
    }
}

pub async fn login(app: &TestApp, email: &str, device: &str) -> Issued {
    issued_from(login_response(app, email, PASSWORD, device).await).await
}

pub async fn refresh_response(app: &TestApp, refresh_token: &str, device: &str) -> Response<Body> {
    send_request(
        app,
        Method::POST,
        "/api/v1/auth/refresh",
        Req { user_agent: Some(device), refresh_cookie: Some(refresh_token), ..Default::default() },
    )
    .await
}

pub async fn get_authed(app: &TestApp, path: &str, token: &str, device: &str) -> Response<Body> {
    send_request(
        app,
        Method::GET,
        path,
        Req { bearer: Some(token), user_agent: Some(device), ..Default::default() },
    )
    .await
}

pub async fn delete_authed(app: &TestApp, path: &str, token: &str, device: &str) -> Response<Body> {
    send_request(
        app,
        Method::DELETE,
        path,
        Req { bearer: Some(token), user_agent: Some(device), ..Default::default() },
    )
    .await
}

pub async fn session_count(app: &TestApp, user_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&app.pool)
        .await
        .expect("count sessions")
}

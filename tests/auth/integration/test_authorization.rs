//! Bearer parsing and role requirements enforced by the middleware stack.

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use serde_json::Value;
use storefront::domain::UserId;
use tower::ServiceExt;

use crate::support::{
    delete_authed, get_authed, login, read_json, register, send_request, setup_test_app, Req,
    DEVICE_A,
};

#[tokio::test]
async fn protected_routes_reject_missing_and_malformed_bearers() {
    let app = setup_test_app().await;

    let response =
        send_request(&app, Method::GET, "/api/v1/users/me", Req::default()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for value in ["Bearer", "Token abc", "Bearer a b", "garbage"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/users/me")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .expect("build request");
        let response = app.router().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        let body: Value = read_json(response).await;
        assert_eq!(body["message"], "unauthorized");
    }

    let response = get_authed(&app, "/api/v1/users/me", "not.a.jwt", DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = setup_test_app().await;
    let target = register(&app, "bob@shop.test").await;
    login(&app, "bob@shop.test", DEVICE_A).await;

    register(&app, "carol@shop.test").await;
    let caller = login(&app, "carol@shop.test", DEVICE_A).await;
    let path = format!("/api/v1/admin/users/{}/sessions", target);

    // Authenticated but lacking ADMIN
    let response = get_authed(&app, &path, &caller.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Not authenticated at all is 401, not 403
    let response = send_request(&app, Method::GET, &path, Req::default()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Roles are read per request, so the grant applies to the existing token
    app.users
        .assign_role(&UserId::from_str_unchecked(&caller.user_id), "admin")
        .await
        .expect("assign role");

    let response = get_authed(&app, &path, &caller.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
    let sessions: Vec<Value> = read_json(response).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["isCurrent"], false);
    assert!(sessions[0].get("refreshToken").is_none());

    let response = delete_authed(&app, &path, &caller.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["revoked"], 1);
}

#[tokio::test]
async fn admin_routes_reject_malformed_user_ids() {
    let app = setup_test_app().await;
    let admin_id = register(&app, "root@shop.test").await;
    app.users.assign_role(&admin_id, "ADMIN").await.expect("assign role");
    let admin = login(&app, "root@shop.test", DEVICE_A).await;

    let response =
        get_authed(&app, "/api/v1/admin/users/not-a-uuid/sessions", &admin.access_token, DEVICE_A)
            .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_user_token_is_unauthorized() {
    let app = setup_test_app().await;
    register(&app, "dave@shop.test").await;
    let issued = login(&app, "dave@shop.test", DEVICE_A).await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&issued.user_id)
        .execute(&app.pool)
        .await
        .expect("delete user");

    let response = get_authed(&app, "/api/v1/users/me", &issued.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_requests_skip_authentication() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/users/me")
        .header(header::ORIGIN, "https://shop.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .expect("build request");
    let response = app.router().oneshot(request).await.expect("request");

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

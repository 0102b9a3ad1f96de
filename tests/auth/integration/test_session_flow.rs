//! Login, refresh rotation, device binding, and logout through the HTTP surface.

use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::support::{
    get_authed, issued_from, login, login_response, read_json, refresh_response, register,
    send_request, session_count, set_cookie, setup_test_app, Req, DEVICE_A, DEVICE_B,
};

#[tokio::test]
async fn login_issues_cookies_and_token_body() {
    let app = setup_test_app().await;
    let user_id = register(&app, "alice@shop.test").await;

    let response = login_response(&app, "alice@shop.test", crate::support::PASSWORD, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);

    let access = set_cookie(&response, "access_token").expect("access cookie");
    let refresh = set_cookie(&response, "refresh_token").expect("refresh cookie");
    assert_ne!(access.http_only(), Some(true));
    assert_eq!(refresh.http_only(), Some(true));
    assert_eq!(refresh.path(), Some("/"));

    let body: Value = read_json(response).await;
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["accessToken"], access.value());
    assert!(body.get("refreshToken").is_none());
    assert!(body["accessTokenExpiresAt"].is_string());
    assert!(body["refreshTokenExpiresAt"].is_string());
}

#[tokio::test]
async fn access_token_reaches_protected_routes_from_its_device_only() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let issued = login(&app, "alice@shop.test", DEVICE_A).await;

    let response = get_authed(&app, "/api/v1/users/me", &issued.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = read_json(response).await;
    assert_eq!(me["email"], "alice@shop.test");
    assert_eq!(me["isActivated"], false);
    assert_eq!(me["roles"], serde_json::json!(["USER"]));

    let response = get_authed(&app, "/api/v1/users/me", &issued.access_token, DEVICE_B).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "unauthorized");
}

#[tokio::test]
async fn refresh_rotates_and_old_token_is_rejected() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let first = login(&app, "alice@shop.test", DEVICE_A).await;

    let second = issued_from(refresh_response(&app, &first.refresh_token, DEVICE_A).await).await;
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);
    assert_eq!(second.user_id, first.user_id);

    let replay = refresh_response(&app, &first.refresh_token, DEVICE_A).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // The rotated token still works after the replay attempt
    let third = refresh_response(&app, &second.refresh_token, DEVICE_A).await;
    assert_eq!(third.status(), StatusCode::OK);
    assert_eq!(session_count(&app, &first.user_id).await, 1);
}

#[tokio::test]
async fn refresh_token_is_bound_to_its_device() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let issued = login(&app, "alice@shop.test", DEVICE_A).await;

    let response = refresh_response(&app, &issued.refresh_token, DEVICE_B).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The legitimate device is unaffected
    let response = refresh_response(&app, &issued.refresh_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let issued = login(&app, "alice@shop.test", DEVICE_A).await;

    let response = refresh_response(&app, &issued.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_authed(&app, "/api/v1/users/me", &issued.refresh_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;

    let wrong = login_response(&app, "alice@shop.test", "not the password", DEVICE_A).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&wrong, "refresh_token").is_none());
    let wrong_body: Value = read_json(wrong).await;

    let unknown = login_response(&app, "nobody@shop.test", "not the password", DEVICE_A).await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body: Value = read_json(unknown).await;

    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "invalid email or password");
}

#[tokio::test]
async fn one_session_per_device() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;

    let first = login(&app, "alice@shop.test", DEVICE_A).await;
    let again = login(&app, "alice@shop.test", DEVICE_A).await;
    assert_eq!(session_count(&app, &first.user_id).await, 1);

    // Logging in again on the same device retires the earlier refresh token
    let stale = refresh_response(&app, &first.refresh_token, DEVICE_A).await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refresh_response(&app, &again.refresh_token, DEVICE_A).await.status(), StatusCode::OK);

    login(&app, "alice@shop.test", DEVICE_B).await;
    assert_eq!(session_count(&app, &first.user_id).await, 2);
}

#[tokio::test]
async fn logout_removes_session_and_clears_cookies() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let issued = login(&app, "alice@shop.test", DEVICE_A).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/logout",
        Req { refresh_cookie: Some(&issued.refresh_token), ..Default::default() },
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = set_cookie(&response, "refresh_token").expect("removal cookie");
    assert_eq!(cleared.value(), "");

    assert_eq!(session_count(&app, &issued.user_id).await, 0);
    let response = refresh_response(&app, &issued.refresh_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A second logout with the same token is still fine
    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/logout",
        Req { refresh_cookie: Some(&issued.refresh_token), ..Default::default() },
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn refresh_and_logout_require_the_cookie() {
    let app = setup_test_app().await;

    for path in ["/api/v1/auth/refresh", "/api/v1/auth/logout"] {
        let response = send_request(&app, Method::POST, path, Req::default()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn missing_user_agent_is_its_own_device() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Req {
            body: Some(serde_json::json!({
                "email": "alice@shop.test",
                "password": crate::support::PASSWORD
            })),
            ..Default::default()
        },
    )
    .await;
    let issued = issued_from(response).await;

    let response = send_request(
        &app,
        Method::GET,
        "/api/v1/users/me",
        Req { bearer: Some(&issued.access_token), ..Default::default() },
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_authed(&app, "/api/v1/users/me", &issued.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_refreshes_spend_the_token_once() {
    let app = setup_test_app().await;
    register(&app, "alice@shop.test").await;
    let issued = login(&app, "alice@shop.test", DEVICE_A).await;

    let (left, right) = tokio::join!(
        refresh_response(&app, &issued.refresh_token, DEVICE_A),
        refresh_response(&app, &issued.refresh_token, DEVICE_A),
    );

    let mut statuses = [left.status().as_u16(), right.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 401]);
    assert_eq!(session_count(&app, &issued.user_id).await, 1);

    // The winner's token is the one now stored
    let winner = if left.status() == StatusCode::OK { left } else { right };
    let rotated = issued_from(winner).await;
    assert_eq!(refresh_response(&app, &rotated.refresh_token, DEVICE_A).await.status(), StatusCode::OK);
}

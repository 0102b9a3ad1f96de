use axum::http::StatusCode;
use serde_json::Value;

use crate::support::{
    delete_authed, get_authed, login, read_json, refresh_response, register, session_count,
    setup_test_app, DEVICE_A, DEVICE_B,
};

const DEVICE_C: &str = "curl/8.5.0";

#[tokio::test]
async fn lists_own_sessions_and_marks_the_current_device() {
    let app = setup_test_app().await;
    register(&app, "erin@shop.test").await;
    login(&app, "erin@shop.test", DEVICE_A).await;
    let on_b = login(&app, "erin@shop.test", DEVICE_B).await;

    let response = get_authed(&app, "/api/v1/sessions", &on_b.access_token, DEVICE_B).await;
    assert_eq!(response.status(), StatusCode::OK);
    let sessions: Vec<Value> = read_json(response).await;

    assert_eq!(sessions.len(), 2);
    let current: Vec<&Value> = sessions.iter().filter(|s| s["isCurrent"] == true).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["userAgent"], DEVICE_B);
    assert!(sessions.iter().all(|s| s.get("refreshToken").is_none()));
}

#[tokio::test]
async fn revoke_one_session_by_id() {
    let app = setup_test_app().await;
    register(&app, "erin@shop.test").await;
    let on_a = login(&app, "erin@shop.test", DEVICE_A).await;
    let on_b = login(&app, "erin@shop.test", DEVICE_B).await;

    let sessions: Vec<Value> =
        read_json(get_authed(&app, "/api/v1/sessions", &on_a.access_token, DEVICE_A).await).await;
    let b_id = sessions
        .iter()
        .find(|s| s["userAgent"] == DEVICE_B)
        .and_then(|s| s["sessionId"].as_str())
        .expect("device B session")
        .to_string();

    let path = format!("/api/v1/sessions/{}", b_id);
    let response = delete_authed(&app, &path, &on_a.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = refresh_response(&app, &on_b.refresh_token, DEVICE_B).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Already gone
    let response = delete_authed(&app, &path, &on_a.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cannot_revoke_another_users_session() {
    let app = setup_test_app().await;
    register(&app, "erin@shop.test").await;
    register(&app, "frank@shop.test").await;
    let erin = login(&app, "erin@shop.test", DEVICE_A).await;
    let frank = login(&app, "frank@shop.test", DEVICE_A).await;

    let sessions: Vec<Value> =
        read_json(get_authed(&app, "/api/v1/sessions", &frank.access_token, DEVICE_A).await)
            .await;
    let frank_session = sessions[0]["sessionId"].as_str().expect("session id").to_string();

    let path = format!("/api/v1/sessions/{}", frank_session);
    let response = delete_authed(&app, &path, &erin.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(session_count(&app, &frank.user_id).await, 1);
}

#[tokio::test]
async fn revoke_others_keeps_the_calling_device() {
    let app = setup_test_app().await;
    register(&app, "erin@shop.test").await;
    let on_a = login(&app, "erin@shop.test", DEVICE_A).await;
    let on_b = login(&app, "erin@shop.test", DEVICE_B).await;
    login(&app, "erin@shop.test", DEVICE_C).await;

    let response = delete_authed(&app, "/api/v1/sessions/others", &on_a.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["revoked"], 2);

    assert_eq!(session_count(&app, &on_a.user_id).await, 1);
    assert_eq!(refresh_response(&app, &on_b.refresh_token, DEVICE_B).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refresh_response(&app, &on_a.refresh_token, DEVICE_A).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn revoke_all_logs_out_everywhere() {
    let app = setup_test_app().await;
    register(&app, "erin@shop.test").await;
    let on_a = login(&app, "erin@shop.test", DEVICE_A).await;
    login(&app, "erin@shop.test", DEVICE_B).await;

    let response = delete_authed(&app, "/api/v1/sessions", &on_a.access_token, DEVICE_A).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["revoked"], 2);

    assert_eq!(session_count(&app, &on_a.user_id).await, 0);
    assert_eq!(refresh_response(&app, &on_a.refresh_token, DEVICE_A).await.status(), StatusCode::UNAUTHORIZED);
}

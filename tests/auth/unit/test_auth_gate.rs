use std::sync::Arc;

use storefront::{
    auth::{AuthError, AuthGate, SessionService, TokenCodec, UserClaims},
    domain::UserId,
    storage::SqlxSessionRepository,
};

use crate::support::{register, setup_test_app};

fn codec(access: &str, refresh: &str) -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(
        access.as_bytes(),
        refresh.as_bytes(),
        chrono::Duration::minutes(15),
        chrono::Duration::days(30),
    ))
}

#[tokio::test]
async fn gate_materializes_roles_for_the_device() {
    let app = setup_test_app().await;
    let user_id = register(&app, "heidi@shop.test").await;

    let codec = Arc::new(TokenCodec::from_config(&app.config.auth));
    let sessions =
        Arc::new(SessionService::new(codec, Arc::new(SqlxSessionRepository::new(app.pool.clone()))));
    let gate = AuthGate::new(sessions.clone(), app.users.clone());

    let pair = sessions.sign(&UserClaims::new(user_id.clone(), "dev1")).expect("sign");
    let header = format!("Bearer {}", pair.access_token);

    let local = gate.authenticate(Some(&header), "dev1").await.expect("authenticated");
    assert_eq!(local.user_id, user_id);
    assert_eq!(local.user_agent, "dev1");
    assert!(local.has_role("user"));

    assert!(matches!(
        gate.authenticate(Some(&header), "dev2").await,
        Err(AuthError::DeviceMismatch)
    ));
    assert!(matches!(gate.authenticate(None, "dev1").await, Err(AuthError::MissingBearer)));
}

#[tokio::test]
async fn gate_rejects_tokens_signed_with_another_secret() {
    let app = setup_test_app().await;
    let user_id = register(&app, "heidi@shop.test").await;

    let foreign = SessionService::new(
        codec("some-other-access-secret-0123456789", "some-other-refresh-secret-0123456789"),
        Arc::new(SqlxSessionRepository::new(app.pool.clone())),
    );
    let pair = foreign.sign(&UserClaims::new(user_id, "dev1")).expect("sign");

    let codec = Arc::new(TokenCodec::from_config(&app.config.auth));
    let sessions =
        Arc::new(SessionService::new(codec, Arc::new(SqlxSessionRepository::new(app.pool.clone()))));
    let gate = AuthGate::new(sessions, app.users.clone());

    let header = format!("Bearer {}", pair.access_token);
    assert!(matches!(gate.authenticate(Some(&header), "dev1").await, Err(AuthError::TokenInvalid)));
}

#[tokio::test]
async fn gate_rejects_unknown_users() {
    let app = setup_test_app().await;

    let codec = Arc::new(TokenCodec::from_config(&app.config.auth));
    let sessions =
        Arc::new(SessionService::new(codec, Arc::new(SqlxSessionRepository::new(app.pool.clone()))));
    let gate = AuthGate::new(sessions.clone(), app.users.clone());

    let pair = sessions.sign(&UserClaims::new(UserId::new(), "dev1")).expect("sign");
    let header = format!("Bearer {}", pair.access_token);
    assert!(matches!(gate.authenticate(Some(&header), "dev1").await, Err(AuthError::UserNotFound)));
}

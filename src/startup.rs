//! Startup wiring for the storefront backend
//!
//! Builds the service graph from configuration and a pool, and optionally
//! grants the `ADMIN` role to an existing account named by environment.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiState;
use crate::auth::{
    hashing::Argon2PasswordEncoder, ActivationMailer, AuthGate, AuthService, MailDispatcher,
    SessionService, TokenCodec,
};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::{DbPool, SqlxSessionRepository, SqlxUserRepository, UserRepository};

/// Environment variable naming an account to promote to `ADMIN` at startup
const ENV_BOOTSTRAP_ADMIN_EMAIL: &str = "STOREFRONT_BOOTSTRAP_ADMIN_EMAIL";

const ADMIN_ROLE: &str = "ADMIN";

/// Fully wired services. The dispatcher is returned separately so the server
/// can drain it on shutdown.
pub struct Services {
    pub api_state: ApiState,
    pub users: Arc<dyn UserRepository>,
    pub mail: MailDispatcher,
}

pub fn build_services(config: &AppConfig, pool: DbPool, mailer: Arc<dyn ActivationMailer>) -> Services {
    let users: Arc<dyn UserRepository> =
        Arc::new(SqlxUserRepository::new(pool.clone(), config.auth.default_role.clone()));
    let session_store = Arc::new(SqlxSessionRepository::new(pool.clone()));

    let codec = Arc::new(TokenCodec::from_config(&config.auth));
    let sessions = Arc::new(SessionService::new(codec, session_store));
    let mail = MailDispatcher::new(mailer, config.auth.activation_base_url.clone());

    let auth = Arc::new(AuthService::new(
        users.clone(),
        Arc::new(Argon2PasswordEncoder::new()),
        sessions.clone(),
        mail.clone(),
    ));
    let gate = Arc::new(AuthGate::new(sessions, users.clone()));

    Services {
        api_state: ApiState {
            auth,
            gate,
            pool,
            secure_cookies: config.auth.secure_cookies,
            request_timeout: config.server.timeout(),
        },
        users,
        mail,
    }
}

/// Grant `ADMIN` to the account named by `STOREFRONT_BOOTSTRAP_ADMIN_EMAIL`.
///
/// Does nothing when the variable is unset. An unknown email is logged, not fatal.
pub async fn grant_bootstrap_admin(users: &dyn UserRepository) -> Result<()> {
    let Some(email) = std::env::var(ENV_BOOTSTRAP_ADMIN_EMAIL).ok().filter(|v| !v.trim().is_empty())
    else {
        return Ok(());
    };

    grant_admin_by_email(users, &email).await
}

async fn grant_admin_by_email(users: &dyn UserRepository, email: &str) -> Result<()> {
    let email = crate::auth::models::User::normalize_email(email);
    match users.find_by_email(&email).await? {
        Some(user) if user.roles.iter().any(|role| role.matches(ADMIN_ROLE)) => {
            info!(user_id = %user.id, "bootstrap admin already holds ADMIN");
        }
        Some(user) => {
            users.assign_role(&user.id, ADMIN_ROLE).await?;
            info!(user_id = %user.id, "granted ADMIN to bootstrap account");
        }
        None => warn!(email = %email, "bootstrap admin account does not exist yet"),
    }
    Ok(())
}

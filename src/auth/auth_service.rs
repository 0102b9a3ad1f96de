//! User-facing authentication flows: registration, login, refresh, logout.

use std::sync::{Arc, LazyLock};

use tracing::{field, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::hashing::{Argon2PasswordEncoder, PasswordEncoder};
use crate::auth::mailer::MailDispatcher;
use crate::auth::models::{AuthError, AuthResponse, NewUser, TokenKind, User, UserClaims};
use crate::auth::session::SessionService;
use crate::auth::validation::{LoginRequest, RegisterRequest};
use crate::domain::UserId;
use crate::errors::StorefrontError;
use crate::observability::metrics;
use crate::storage::repositories::UserRepository;

/// Well-formed hash with the encoder's parameters. It matches no password but
/// still costs a full Argon2 run to verify.
const DUMMY_HASH_FALLBACK: &str =
    "$argon2id$v=19$m=768,t=1,p=1$c3RvcmVmcm9udC1kdW1teQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Verified against when the email is unknown so the response time does not
/// reveal whether an account exists.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    Argon2PasswordEncoder::new()
        .hash_password("dummy_startup_value")
        .unwrap_or_else(|_| DUMMY_HASH_FALLBACK.to_string())
});

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordEncoder>,
    sessions: Arc<SessionService>,
    mail: MailDispatcher,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordEncoder>,
        sessions: Arc<SessionService>,
        mail: MailDispatcher,
    ) -> Self {
        Self { users, passwords, sessions, mail }
    }

    pub fn sessions(&self) -> &Arc<SessionService> {
        &self.sessions
    }

    /// Create an inactive account and queue its activation email.
    ///
    /// No session is opened; the client logs in separately.
    #[instrument(skip(self, request), fields(email = %request.email, user_id = field::Empty))]
    pub async fn registration(&self, request: RegisterRequest) -> Result<UserId, AuthError> {
        request.validate()?;
        let email = User::normalize_email(&request.email);

        if self.users.find_by_email(&email).await?.is_some() {
            metrics::record_registration("already_registered").await;
            return Err(AuthError::UserAlreadyRegistered);
        }

        let password_hash = self.passwords.hash_password(&request.password)?;
        let new_user = NewUser {
            id: UserId::new(),
            email,
            password_hash,
            activation_link: Uuid::new_v4().to_string(),
        };

        let user = match self.users.create(new_user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration for the same email
            Err(err) if err.is_constraint_violation() => {
                metrics::record_registration("already_registered").await;
                return Err(AuthError::UserAlreadyRegistered);
            }
            Err(err) => return Err(err.into()),
        };

        tracing::Span::current().record("user_id", field::display(&user.id));
        self.mail.dispatch_activation(&user.email, &user.activation_link);
        metrics::record_registration("success").await;
        info!(user_id = %user.id, "user registered");

        Ok(user.id)
    }

    #[instrument(skip(self, request, user_agent), fields(email = %request.email, user_id = field::Empty))]
    pub async fn login(
        &self,
        request: &LoginRequest,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
        request.validate()?;
        let email = User::normalize_email(&request.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            if let Err(e) = self.passwords.compare_passwords(&request.password, &DUMMY_HASH) {
                warn!(error = %e, "dummy hash verification failed unexpectedly");
            }
            warn!("login attempt for unknown email");
            metrics::record_authentication(AuthError::InvalidCredentials.metric_label()).await;
            return Err(AuthError::InvalidCredentials);
        };
        tracing::Span::current().record("user_id", field::display(&user.id));

        if !self.passwords.compare_passwords(&request.password, &user.password_hash)? {
            warn!("login attempt with incorrect password");
            metrics::record_authentication(AuthError::InvalidCredentials.metric_label()).await;
            return Err(AuthError::InvalidCredentials);
        }

        let response = self.issue(user.id, user_agent).await?;
        info!("login succeeded");
        Ok(response)
    }

    /// Exchange a stored refresh token for a new pair bound to the same device.
    #[instrument(skip(self, refresh_token, user_agent), fields(user_id = field::Empty))]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
        let result = self.try_refresh(refresh_token, user_agent).await;
        if let Err(err) = &result {
            warn!(reason = err.metric_label(), "refresh rejected");
            metrics::record_authentication(err.metric_label()).await;
        }
        result
    }

    async fn try_refresh(
        &self,
        refresh_token: &str,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
        let claims = self.sessions.parse(refresh_token, TokenKind::Refresh)?;
        tracing::Span::current().record("user_id", field::display(&claims.user_id));

        if claims.user_agent != user_agent {
            return Err(AuthError::DeviceMismatch);
        }

        let session = self
            .sessions
            .find_by_device_and_token(&claims.user_agent, refresh_token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        if session.user_id != claims.user_id {
            return Err(AuthError::SessionNotFound);
        }

        let user = self.users.find_by_id(&claims.user_id).await?.ok_or(AuthError::UserNotFound)?;

        let next = UserClaims::new(user.id, &claims.user_agent);
        let tokens = self.sessions.sign(&next)?;
        // Fails when a concurrent refresh already spent this token
        self.sessions
            .rotate(&next.user_id, &next.user_agent, refresh_token, &tokens.refresh_token)
            .await?;

        Ok(AuthResponse { user_id: next.user_id, tokens })
    }

    /// Delete the session holding this refresh token. Unknown tokens are not an error.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let removed = self.sessions.remove_by_token(refresh_token).await?;
        info!(removed, "logout");
        Ok(())
    }

    #[instrument(skip(self, activation_link))]
    pub async fn activate(&self, activation_link: &str) -> Result<(), AuthError> {
        if self.users.activate(activation_link).await? {
            info!("account activated");
            Ok(())
        } else {
            Err(StorefrontError::not_found("Activation link", activation_link).into())
        }
    }

    pub async fn current_user(&self, user_id: &UserId) -> Result<User, AuthError> {
        self.users.find_by_id(user_id).await?.ok_or(AuthError::UserNotFound)
    }

    async fn issue(&self, user_id: UserId, user_agent: &str) -> Result<AuthResponse, AuthError> {
        let claims = UserClaims::new(user_id, user_agent);
        let tokens = self.sessions.sign(&claims)?;
        self.sessions
            .create_or_rotate(&claims.user_id, &claims.user_agent, &tokens.refresh_token)
            .await?;

        Ok(AuthResponse { user_id: claims.user_id, tokens })
    }
}

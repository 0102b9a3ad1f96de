//! Session orchestration: token codec plus session store.
//!
//! Logins write through `create_or_rotate`, which invalidates whatever token
//! the same device held before. Refresh writes through `rotate`, which only
//! succeeds while the presented token is still the stored one, so a refresh
//! token can be spent once even under concurrent requests.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::auth::jwt::TokenCodec;
use crate::auth::models::{AuthError, Session, SessionSummary, TokenKind, TokenPair, UserClaims};
use crate::domain::{SessionId, UserId};
use crate::observability::metrics;
use crate::storage::repositories::SessionRepository;

#[derive(Clone)]
pub struct SessionService {
    codec: Arc<TokenCodec>,
    repository: Arc<dyn SessionRepository>,
}

impl SessionService {
    pub fn new(codec: Arc<TokenCodec>, repository: Arc<dyn SessionRepository>) -> Self {
        Self { codec, repository }
    }

    pub fn sign(&self, claims: &UserClaims) -> Result<TokenPair, AuthError> {
        Ok(self.codec.sign(claims)?)
    }

    /// Any codec failure (bad signature, wrong algorithm, expiry, garbage) is `TokenInvalid`.
    pub fn parse(&self, token: &str, kind: TokenKind) -> Result<UserClaims, AuthError> {
        self.codec.parse(token, kind).map_err(|err| {
            debug!(kind = %kind, error = %err, "token rejected");
            AuthError::TokenInvalid
        })
    }

    #[instrument(skip(self, refresh_token), fields(user_id = %user_id, user_agent = %user_agent))]
    pub async fn create_or_rotate(
        &self,
        user_id: &UserId,
        user_agent: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        let session = self.repository.upsert(user_id, user_agent, refresh_token).await?;
        metrics::record_session_rotated().await;
        Ok(session)
    }

    /// Swap `expected` for `refresh_token`. Losing the race is `SessionNotFound`.
    #[instrument(skip(self, expected, refresh_token), fields(user_id = %user_id, user_agent = %user_agent))]
    pub async fn rotate(
        &self,
        user_id: &UserId,
        user_agent: &str,
        expected: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        let session = self
            .repository
            .rotate(user_id, user_agent, expected, refresh_token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        metrics::record_session_rotated().await;
        Ok(session)
    }

    pub async fn find_by_device_and_token(
        &self,
        user_agent: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>, AuthError> {
        Ok(self.repository.find_by_device_and_token(user_agent, refresh_token).await?)
    }

    pub async fn find_current(
        &self,
        user_id: &UserId,
        user_agent: &str,
    ) -> Result<Option<Session>, AuthError> {
        Ok(self.repository.find_by_device_and_user(user_agent, user_id).await?)
    }

    pub async fn remove_by_token(&self, refresh_token: &str) -> Result<u64, AuthError> {
        let removed = self.repository.remove_by_token(refresh_token).await?;
        metrics::record_sessions_revoked(removed).await;
        Ok(removed)
    }

    pub async fn remove_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<bool, AuthError> {
        let removed = self.repository.remove_session(user_id, session_id).await?;
        metrics::record_sessions_revoked(u64::from(removed)).await;
        Ok(removed)
    }

    pub async fn remove_all_except_current(
        &self,
        user_id: &UserId,
        current_session_id: &SessionId,
    ) -> Result<u64, AuthError> {
        let removed =
            self.repository.remove_all_except_current(user_id, current_session_id).await?;
        metrics::record_sessions_revoked(removed).await;
        Ok(removed)
    }

    pub async fn remove_all(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let removed = self.repository.remove_all(user_id).await?;
        metrics::record_sessions_revoked(removed).await;
        Ok(removed)
    }

    pub async fn list_sessions(
        &self,
        user_id: &UserId,
        requesting_device: &str,
    ) -> Result<Vec<SessionSummary>, AuthError> {
        Ok(self.repository.list_sessions(user_id, requesting_device).await?)
    }
}

//! Session store: the refresh token currently valid for each (user, device)
//!
//! The `(user_id, user_agent)` pair is unique. `upsert` is a single statement,
//! so concurrent logins from the same device converge on one row holding
//! whichever token was written last.

use crate::auth::models::{Session, SessionSummary};
use crate::domain::{SessionId, UserId};
use crate::errors::{Result, StorefrontError};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub user_agent: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId::from_string(row.id),
            user_id: UserId::from_string(row.user_id),
            user_agent: row.user_agent,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_device_and_token(
        &self,
        user_agent: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>>;

    async fn find_by_device_and_user(
        &self,
        user_agent: &str,
        user_id: &UserId,
    ) -> Result<Option<Session>>;

    /// Insert the device's session or replace its refresh token
    async fn upsert(&self, user_id: &UserId, user_agent: &str, refresh_token: &str)
        -> Result<Session>;

    /// Replace the device's token only while it still holds `expected`.
    /// `None` when another writer rotated or removed it first.
    async fn rotate(
        &self,
        user_id: &UserId,
        user_agent: &str,
        expected: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>>;

    /// Returns the number of rows removed (0 when the token is unknown)
    async fn remove_by_token(&self, refresh_token: &str) -> Result<u64>;

    /// Removes the session only when it belongs to `user_id`
    async fn remove_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<bool>;

    async fn remove_all_except_current(
        &self,
        user_id: &UserId,
        current_session_id: &SessionId,
    ) -> Result<u64>;

    async fn remove_all(&self, user_id: &UserId) -> Result<u64>;

    /// Most recently used first
    async fn list_sessions(
        &self,
        user_id: &UserId,
        requesting_device: &str,
    ) -> Result<Vec<SessionSummary>>;
}

#[derive(Debug, Clone)]
pub struct SqlxSessionRepository {
    pool: DbPool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    #[instrument(skip(self, refresh_token), fields(user_agent = %user_agent), name = "db_find_session_by_token")]
    async fn find_by_device_and_token(
        &self,
        user_agent: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, user_agent, refresh_token, created_at, updated_at
            FROM sessions
            WHERE user_agent = ? AND refresh_token = ?
            "#,
        )
        .bind(user_agent)
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to fetch session by token"))?;

        Ok(row.map(Session::from))
    }

    #[instrument(skip(self), fields(user_id = %user_id, user_agent = %user_agent), name = "db_find_session_by_user")]
    async fn find_by_device_and_user(
        &self,
        user_agent: &str,
        user_id: &UserId,
    ) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, user_agent, refresh_token, created_at, updated_at
            FROM sessions
            WHERE user_agent = ? AND user_id = ?
            "#,
        )
        .bind(user_agent)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to fetch session by user"))?;

        Ok(row.map(Session::from))
    }

    #[instrument(skip(self, refresh_token), fields(user_id = %user_id, user_agent = %user_agent), name = "db_upsert_session")]
    async fn upsert(
        &self,
        user_id: &UserId,
        user_agent: &str,
        refresh_token: &str,
    ) -> Result<Session> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (id, user_id, user_agent, refresh_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, user_agent) DO UPDATE SET
                refresh_token = excluded.refresh_token,
                updated_at = excluded.updated_at
            RETURNING id, user_id, user_agent, refresh_token, created_at, updated_at
            "#,
        )
        .bind(SessionId::new().as_str())
        .bind(user_id.as_str())
        .bind(user_agent)
        .bind(refresh_token)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to upsert session"))?;

        Ok(row.into())
    }

    #[instrument(skip(self, expected, refresh_token), fields(user_id = %user_id, user_agent = %user_agent), name = "db_rotate_session")]
    async fn rotate(
        &self,
        user_id: &UserId,
        user_agent: &str,
        expected: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE sessions
            SET refresh_token = ?, updated_at = ?
            WHERE user_id = ? AND user_agent = ? AND refresh_token = ?
            RETURNING id, user_id, user_agent, refresh_token, created_at, updated_at
            "#,
        )
        .bind(refresh_token)
        .bind(Utc::now())
        .bind(user_id.as_str())
        .bind(user_agent)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to rotate session"))?;

        Ok(row.map(Session::from))
    }

    #[instrument(skip(self, refresh_token), name = "db_remove_session_by_token")]
    async fn remove_by_token(&self, refresh_token: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_token = ?")
            .bind(refresh_token)
            .execute(&self.pool)
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to remove session by token"))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id), name = "db_remove_session")]
    async fn remove_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ? AND user_id = ?")
            .bind(session_id.as_str())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to remove session"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %user_id, keep = %current_session_id), name = "db_remove_other_sessions")]
    async fn remove_all_except_current(
        &self,
        user_id: &UserId,
        current_session_id: &SessionId,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND id <> ?")
            .bind(user_id.as_str())
            .bind(current_session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to remove other sessions"))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = %user_id), name = "db_remove_all_sessions")]
    async fn remove_all(&self, user_id: &UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to remove all sessions"))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = %user_id), name = "db_list_sessions")]
    async fn list_sessions(
        &self,
        user_id: &UserId,
        requesting_device: &str,
    ) -> Result<Vec<SessionSummary>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, user_agent, refresh_token, created_at, updated_at
            FROM sessions
            WHERE user_id = ?
            ORDER BY updated_at DESC, created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to list sessions"))?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                is_current: row.user_agent == requesting_device,
                session_id: SessionId::from_string(row.id),
                user_agent: row.user_agent,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

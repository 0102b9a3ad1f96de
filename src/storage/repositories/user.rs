//! Credential store: users and their roles
//!
//! Users are created inactive with the configured default role. Emails are
//! expected to be normalized by the caller.

use crate::auth::models::{NewUser, Role, User};
use crate::domain::{RoleId, UserId};
use crate::errors::{Result, StorefrontError};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_activated: bool,
    pub activation_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct RoleRow {
    pub id: String,
    pub title: String,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, is_activated, activation_link, created_at, updated_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user with roles by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a user with roles by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>>;

    /// Create an inactive user holding the default role
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Activate the account owning this activation link. False when no account matches.
    async fn activate(&self, activation_link: &str) -> Result<bool>;

    /// Grant a role, creating the role when it does not exist yet
    async fn assign_role(&self, user_id: &UserId, title: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
    default_role: String,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool, default_role: impl AsRef<str>) -> Self {
        Self { pool, default_role: Role::normalize_title(default_role.as_ref()) }
    }

    async fn load_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.title
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to fetch user roles"))?;

        Ok(rows
            .into_iter()
            .map(|row| Role { id: RoleId::from_string(row.id), title: row.title })
            .collect())
    }

    async fn row_to_user(&self, row: UserRow) -> Result<User> {
        let roles = self.load_roles(&row.id).await?;

        Ok(User {
            id: UserId::from_string(row.id),
            email: row.email,
            password_hash: row.password_hash,
            is_activated: row.is_activated,
            activation_link: row.activation_link,
            roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn ensure_role(conn: &mut SqliteConnection, title: &str) -> Result<()> {
        sqlx::query("INSERT INTO roles (id, title) VALUES (?, ?) ON CONFLICT(title) DO NOTHING")
            .bind(RoleId::new().as_str())
            .bind(title)
            .execute(&mut *conn)
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to ensure role exists"))?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self), fields(user_email = %email), name = "db_find_user_by_email")]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to fetch user by email"))?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_find_user_by_id")]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to fetch user"))?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, user), fields(user_email = %user.email, user_id = %user.id), name = "db_create_user")]
    async fn create(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to start user transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_activated, activation_link, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.activation_link)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to create user"))?;

        Self::ensure_role(&mut *tx, &self.default_role).await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE title = ?",
        )
        .bind(user.id.as_str())
        .bind(&self.default_role)
        .execute(&mut *tx)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to assign default role"))?;

        tx.commit()
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to commit user creation"))?;

        self.find_by_id(&user.id)
            .await?
            .ok_or_else(|| StorefrontError::internal("User not found after creation"))
    }

    #[instrument(skip(self, activation_link), name = "db_activate_user")]
    async fn activate(&self, activation_link: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_activated = 1, updated_at = ? WHERE activation_link = ?",
        )
        .bind(Utc::now())
        .bind(activation_link)
        .execute(&self.pool)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to activate user"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %user_id, role = %title), name = "db_assign_role")]
    async fn assign_role(&self, user_id: &UserId, title: &str) -> Result<()> {
        let title = Role::normalize_title(title);
        if title.is_empty() {
            return Err(StorefrontError::validation_field("Role title cannot be empty", "title"));
        }

        if self.find_by_id(user_id).await?.is_none() {
            return Err(StorefrontError::not_found("User", user_id.as_str()));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to start role transaction"))?;

        Self::ensure_role(&mut *tx, &title).await?;

        sqlx::query(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE title = ?",
        )
        .bind(user_id.as_str())
        .bind(&title)
        .execute(&mut *tx)
        .await
        .map_err(|err| StorefrontError::database(err, "Failed to assign role"))?;

        tx.commit()
            .await
            .map_err(|err| StorefrontError::database(err, "Failed to commit role assignment"))?;

        Ok(())
    }
}

//! # Storage and Persistence
//!
//! SQLite connectivity, embedded migrations, and the credential and session
//! stores used by the auth services.

pub mod migrations;
pub mod pool;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use crate::config::DatabaseConfig;

pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool};
pub use repositories::{
    SessionRepository, SqlxSessionRepository, SqlxUserRepository, UserRepository,
};

use crate::errors::{Result, StorefrontError};

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| StorefrontError::database(e, "Database connectivity check failed"))?;

    Ok(())
}

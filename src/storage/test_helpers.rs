//! Test database utilities for in-library tests.
//!
//! Each call returns a fresh, fully migrated database, so tests never share
//! state.

use crate::config::DatabaseConfig;
use crate::storage::{create_pool, DbPool};
use tempfile::TempDir;

pub async fn memory_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        auto_migrate: true,
        ..Default::default()
    };

    create_pool(&config).await.unwrap_or_else(|e| panic!("Failed to create test database: {}", e))
}

/// File-backed database with a real multi-connection pool, for tests that need
/// writers racing on separate connections. Keep the `TempDir` alive.
pub async fn file_pool(max_connections: u32) -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("Failed to create temp dir: {}", e));
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("storefront.db").display()),
        max_connections,
        auto_migrate: true,
        ..Default::default()
    };

    let pool =
        create_pool(&config).await.unwrap_or_else(|e| panic!("Failed to create test database: {}", e));
    (dir, pool)
}

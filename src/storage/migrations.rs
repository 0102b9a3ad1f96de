//! # Database Migration Management
//!
//! SQL migrations are compiled into the binary and applied in version order on
//! startup when `auto_migrate` is enabled. Each applied migration is recorded
//! in `_storefront_migrations` together with a checksum of its content.

use crate::errors::{Result, StorefrontError};
use crate::storage::DbPool;
use sqlx::Row;
use tracing::{error, info};

/// Embedded migrations as `(filename stem, sql)`, sorted by version prefix
const MIGRATIONS: &[(&str, &str)] = &[(
    "20250101000001_create_auth_tables",
    include_str!("../../migrations/20250101000001_create_auth_tables.sql"),
)];

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Starting database migration process");

    create_migration_table(pool).await?;
    let applied = get_applied_migration_versions(pool).await?;

    let mut migrations_run = 0;
    for (filename, sql) in MIGRATIONS {
        let version = extract_version_from_filename(filename)?;

        if applied.contains(&version) {
            info!(version = version, "Migration already applied: {}", filename);
            continue;
        }

        info!(version = version, "Running migration: {}", filename);
        let start_time = std::time::Instant::now();

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| StorefrontError::database(e, "Failed to start migration transaction"))?;

        // raw_sql allows multi-statement migration files
        sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(|e| {
            error!(error = %e, migration = filename, "Migration failed");
            StorefrontError::database(e, format!("Migration failed: {}", filename))
        })?;

        let execution_time = start_time.elapsed().as_millis() as i64;
        let checksum = calculate_checksum(sql);

        sqlx::query(
            "INSERT INTO _storefront_migrations (version, description, checksum, execution_time, installed_on) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(version)
        .bind(*filename)
        .bind(&checksum)
        .bind(execution_time)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, migration = filename, "Failed to record migration");
            StorefrontError::database(e, format!("Failed to record migration: {}", filename))
        })?;

        tx.commit()
            .await
            .map_err(|e| StorefrontError::database(e, "Failed to commit migration transaction"))?;

        migrations_run += 1;
        info!(
            version = version,
            execution_time_ms = execution_time,
            "Migration completed: {}",
            filename
        );
    }

    if migrations_run > 0 {
        info!(count = migrations_run, "Database migrations completed");
    } else {
        info!("No pending migrations");
    }

    Ok(())
}

async fn create_migration_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _storefront_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            checksum BLOB NOT NULL,
            execution_time INTEGER NOT NULL,
            installed_on TEXT NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StorefrontError::database(e, "Failed to create migration tracking table"))?;

    Ok(())
}

fn is_missing_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err)
        if db_err.message().contains("no such table: _storefront_migrations"))
}

async fn get_applied_migration_versions(pool: &DbPool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT version FROM _storefront_migrations ORDER BY version")
        .fetch_all(pool)
        .await;

    match rows {
        Ok(rows) => Ok(rows.into_iter().map(|row| row.get::<i64, _>("version")).collect()),
        // Nothing has been applied before the tracking table exists
        Err(e) if is_missing_table(&e) => Ok(Vec::new()),
        Err(e) => Err(StorefrontError::database(e, "Failed to get applied migrations")),
    }
}

fn extract_version_from_filename(filename: &str) -> Result<i64> {
    let version_str = filename.split('_').next().ok_or_else(|| {
        StorefrontError::validation(format!("Invalid migration filename: {}", filename))
    })?;

    version_str.parse::<i64>().map_err(|_| {
        StorefrontError::validation(format!("Invalid version in filename: {}", filename))
    })
}

fn calculate_checksum(content: &str) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish().to_le_bytes().to_vec()
}

//! Applies schema migrations from a directory to a target database.
//!
//! Migration files use the reversible layout understood by sqlx:
//! `<version>_<name>.up.sql` and `<version>_<name>.down.sql`.

use errors::ContainerError;
use sqlx::migrate::Migrator;
use sqlx::{Connection, PgConnection};
use std::path::Path;

/// Loads every migration found in `source_dir` without touching a database.
pub async fn load_migrator(source_dir: &Path) -> Result<Migrator, ContainerError> {
    Migrator::new(source_dir.to_path_buf())
        .await
        .map_err(|e| migration_error(source_dir, e))
}

/// Number of forward migrations a migrator will apply on a fresh database.
pub fn pending_up_migrations(migrator: &Migrator) -> usize {
    migrator
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .count()
}

/// Applies all pending migrations from `source_dir` over a dedicated
/// connection to `database_url`.
///
/// Returns the number of forward migrations known to the source.
pub async fn run_migrations(source_dir: &Path, database_url: &str) -> Result<usize, ContainerError> {
    let migrator = load_migrator(source_dir).await?;

    let mut conn = PgConnection::connect(database_url)
        .await
        .map_err(|e| migration_error(source_dir, e))?;
    let applied = migrator.run_direct(None, &mut conn, false).await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close migration connection");
    }
    applied.map_err(|e| migration_error(source_dir, e))?;

    let count = pending_up_migrations(&migrator);
    tracing::info!(source = %source_dir.display(), migrations = count, "Database migrated");
    Ok(count)
}

fn migration_error(source_dir: &Path, e: impl std::fmt::Display) -> ContainerError {
    ContainerError::Migration {
        source_dir: source_dir.display().to_string(),
        reason: e.to_string()
    }
}

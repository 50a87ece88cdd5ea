//! Database initialization
//!
//! Pipeline state is volatile: every service starts from an empty database.
//! A file-backed store is recreated at startup; without a path the store
//! lives in memory for the lifetime of the pool.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open a fresh file-backed database, discarding any previous contents
pub async fn open_volatile(db_path: &Path) -> Result<SqlitePool> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if db_path.exists() {
        std::fs::remove_file(db_path)?;
        info!("Deleted previous database: {}", db_path.display());
    }
    for suffix in ["-wal", "-shm"] {
        let side_file = db_path.with_file_name(format!(
            "{}{}",
            db_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            suffix
        ));
        if side_file.exists() {
            std::fs::remove_file(&side_file)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // WAL allows readers alongside the single writer task
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    info!("Initialized new database: {}", db_path.display());

    Ok(pool)
}

/// Open an in-memory database
///
/// Each SQLite connection to `:memory:` is a separate database, so the pool
/// is pinned to one connection that is never recycled.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    Ok(pool)
}

/// Open the configured store: file-backed when a path is given, in memory otherwise
pub async fn open_store(db_path: Option<&Path>) -> Result<SqlitePool> {
    match db_path {
        Some(path) => open_volatile(path).await,
        None => {
            info!("No database path configured, using in-memory store");
            open_in_memory().await
        }
    }
}

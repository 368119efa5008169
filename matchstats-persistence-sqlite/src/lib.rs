use std::path::Path;

use matchstats_domain::{ServiceError, ServiceResult};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod seed;
pub mod stats;

/// Lazily connecting pool over the database file. The file and its parent directory
/// are created if they do not exist yet.
fn create_stats_db_pool(db_path: &Path) -> ServiceResult<Pool<Sqlite>> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ServiceError::Internal(format!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let conn_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(conn_options))
}

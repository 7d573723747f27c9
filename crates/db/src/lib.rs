//! Read-only access to the per-experiment SQLite databases.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod index;
pub mod models;
pub mod repositories;
pub mod schema;

pub use index::AnnotationIndex;
pub use schema::{SchemaVariant, TableSet};

pub type DbPool = sqlx::SqlitePool;

/// Open a read-only connection pool on an existing experiment database.
pub async fn open_pool(path: &Path, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
}

/// Verify the pool can execute a query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

//! Repository for the `METADATA` key/value table.

use sqlx::SqlitePool;

use crate::models::metadata::MetadataEntry;

pub struct MetadataRepo;

impl MetadataRepo {
    /// All entries, ordered by field name.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<MetadataEntry>, sqlx::Error> {
        sqlx::query_as::<_, MetadataEntry>(
            "SELECT field, CAST(value AS TEXT) AS value FROM METADATA ORDER BY field",
        )
        .fetch_all(pool)
        .await
    }
}

//! Repository for the `CONCATENATION` table.

use sqlx::SqlitePool;

use crate::models::concatenation::ConcatenationLink;

const COLUMNS: &str = "id, chunk, local_identity, local_identity_after, \
    COALESCE(is_inferred, 0) != 0 AS is_inferred, \
    COALESCE(is_broken, 0) != 0 AS is_broken";

pub struct ConcatenationRepo;

impl ConcatenationRepo {
    /// Links leaving `chunk`, ordered by local identity.
    pub async fn list_by_chunk(
        pool: &SqlitePool,
        chunk: i64,
    ) -> Result<Vec<ConcatenationLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM CONCATENATION
             WHERE chunk = $1
             ORDER BY local_identity ASC, id ASC"
        );
        sqlx::query_as::<_, ConcatenationLink>(&query)
            .bind(chunk)
            .fetch_all(pool)
            .await
    }
}

//! Repository for tracked detections (`ROI_0` or `ROI_0_VAL`) joined with
//! identity assignments (`IDENTITY` or `IDENTITY_VAL`).

use sqlx::SqlitePool;
use trackval_core::types::FrameNumber;

use crate::models::tracking::TrackedDetection;
use crate::schema::TableSet;

pub struct TrackingRepo;

impl TrackingRepo {
    /// Detections of one frame, ordered by identity (unassigned last), then
    /// by in-frame index.
    pub async fn list_at_frame(
        pool: &SqlitePool,
        tables: &TableSet,
        frame_number: FrameNumber,
    ) -> Result<Vec<TrackedDetection>, sqlx::Error> {
        let fragment = if tables.has_fragment {
            "CAST(NULLIF(r.fragment, 'None') AS INTEGER)"
        } else {
            "NULL"
        };
        let query = format!(
            "SELECT r.frame_number, r.in_frame_index,
                    CAST(r.x AS REAL) AS x, CAST(r.y AS REAL) AS y,
                    CAST(COALESCE(r.area, 0) AS INTEGER) AS area,
                    LOWER(CAST(COALESCE(r.modified, '') AS TEXT)) IN ('1', 'true') AS modified,
                    {fragment} AS fragment,
                    i.identity, i.local_identity
             FROM {roi} r
             LEFT JOIN {identity} i
               ON i.frame_number = r.frame_number AND i.in_frame_index = r.in_frame_index
             WHERE r.frame_number = $1
             ORDER BY i.identity IS NULL, i.identity ASC, r.in_frame_index ASC",
            roi = tables.tracking,
            identity = tables.identity,
        );
        sqlx::query_as::<_, TrackedDetection>(&query)
            .bind(frame_number)
            .fetch_all(pool)
            .await
    }
}

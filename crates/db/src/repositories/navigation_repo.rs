//! Directional nearest-match queries.
//!
//! Each query returns the closest qualifying frame strictly after
//! ([`Direction::Next`]) or strictly before ([`Direction::Previous`]) the
//! given frame, or `None`.

use sqlx::SqlitePool;
use trackval_core::navigation::Direction;
use trackval_core::types::FrameNumber;

use crate::models::ai::AiLabel;
use crate::schema::TableSet;

pub struct NavigationRepo;

/// `(comparison, sort order)` for a direction.
fn bounds(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Next => (">", "ASC"),
        Direction::Previous => ("<", "DESC"),
    }
}

impl NavigationRepo {
    /// Nearest frame with a failed identity assignment (`identity = 0`).
    ///
    /// Among rows of the same frame the lowest id wins going forward and the
    /// highest id going backward.
    pub async fn find_error(
        pool: &SqlitePool,
        tables: &TableSet,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<Option<FrameNumber>, sqlx::Error> {
        let (cmp, order) = bounds(direction);
        let query = format!(
            "SELECT frame_number FROM {identity}
             WHERE frame_number {cmp} $1 AND identity = 0
             ORDER BY frame_number {order}, id {order}
             LIMIT 1",
            identity = tables.identity,
        );
        let row: Option<(FrameNumber,)> = sqlx::query_as(&query)
            .bind(frame_number)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(f,)| f))
    }

    /// Nearest frame whose identity rows all carry a nonzero identity.
    ///
    /// Frames without any identity row never qualify.
    pub async fn find_ok(
        pool: &SqlitePool,
        tables: &TableSet,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<Option<FrameNumber>, sqlx::Error> {
        let (cmp, order) = bounds(direction);
        let query = format!(
            "SELECT frame_number FROM (
                SELECT frame_number, MIN(identity) AS min_identity
                FROM {identity}
                WHERE frame_number {cmp} $1
                GROUP BY frame_number
             )
             WHERE min_identity != 0
             ORDER BY frame_number {order}
             LIMIT 1",
            identity = tables.identity,
        );
        let row: Option<(FrameNumber,)> = sqlx::query_as(&query)
            .bind(frame_number)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(f,)| f))
    }

    /// Nearest frame with an AI verdict. `None` when the database has no AI table.
    pub async fn find_ai(
        pool: &SqlitePool,
        tables: &TableSet,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<Option<AiLabel>, sqlx::Error> {
        if !tables.has_ai {
            return Ok(None);
        }
        let (cmp, order) = bounds(direction);
        let query = format!(
            "SELECT frame_number, CAST(ai AS TEXT) AS label FROM {ai}
             WHERE frame_number {cmp} $1
             ORDER BY frame_number {order}
             LIMIT 1",
            ai = TableSet::AI,
        );
        sqlx::query_as::<_, AiLabel>(&query)
            .bind(frame_number)
            .fetch_optional(pool)
            .await
    }
}

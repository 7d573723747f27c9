//! Query surface over one experiment's annotations.

use std::path::Path;

use trackval_core::navigation::{Direction, NavigationHit, NavigationKind, NavigationOutcome, RejectionList};
use trackval_core::types::FrameNumber;

use crate::models::concatenation::ConcatenationLink;
use crate::models::metadata::MetadataEntry;
use crate::models::tracking::TrackedDetection;
use crate::repositories::{ConcatenationRepo, MetadataRepo, NavigationRepo, TrackingRepo};
use crate::schema::TableSet;
use crate::DbPool;

/// Read-only annotations of one experiment: the database pool, its detected
/// table layout, and the externally produced rejection list.
#[derive(Debug, Clone)]
pub struct AnnotationIndex {
    pool: DbPool,
    tables: TableSet,
    rejections: RejectionList,
}

impl AnnotationIndex {
    pub fn new(pool: DbPool, tables: TableSet, rejections: RejectionList) -> Self {
        Self {
            pool,
            tables,
            rejections,
        }
    }

    /// Open the database at `path` and detect its layout.
    pub async fn open(
        path: &Path,
        max_connections: u32,
        rejections: RejectionList,
    ) -> Result<Self, sqlx::Error> {
        let pool = crate::open_pool(path, max_connections).await?;
        match TableSet::detect(&pool).await {
            Ok(tables) => Ok(Self::new(pool, tables, rejections)),
            Err(e) => {
                pool.close().await;
                Err(e)
            }
        }
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn rejections(&self) -> &RejectionList {
        &self.rejections
    }

    pub async fn metadata_entries(&self) -> Result<Vec<MetadataEntry>, sqlx::Error> {
        MetadataRepo::list(&self.pool).await
    }

    pub async fn tracking_at(&self, frame_number: FrameNumber) -> Result<Vec<TrackedDetection>, sqlx::Error> {
        TrackingRepo::list_at_frame(&self.pool, &self.tables, frame_number).await
    }

    /// Concatenation links of a chunk; empty when the table does not exist.
    pub async fn concatenation_for_chunk(&self, chunk: i64) -> Result<Vec<ConcatenationLink>, sqlx::Error> {
        if !self.tables.has_concatenation {
            return Ok(Vec::new());
        }
        ConcatenationRepo::list_by_chunk(&self.pool, chunk).await
    }

    pub async fn find_error(
        &self,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<NavigationOutcome, sqlx::Error> {
        let hit = NavigationRepo::find_error(&self.pool, &self.tables, frame_number, direction).await?;
        Ok(NavigationOutcome::from_frame(hit))
    }

    pub async fn find_ok(
        &self,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<NavigationOutcome, sqlx::Error> {
        let hit = NavigationRepo::find_ok(&self.pool, &self.tables, frame_number, direction).await?;
        Ok(NavigationOutcome::from_frame(hit))
    }

    pub async fn find_ai(
        &self,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<NavigationOutcome, sqlx::Error> {
        let hit = NavigationRepo::find_ai(&self.pool, &self.tables, frame_number, direction).await?;
        Ok(match hit {
            Some(ai) => NavigationOutcome::Found(NavigationHit {
                frame_number: ai.frame_number,
                label: ai.label,
            }),
            None => NavigationOutcome::Exhausted,
        })
    }

    pub fn find_rejection(&self, frame_number: FrameNumber, direction: Direction) -> NavigationOutcome {
        self.rejections.find(frame_number, direction)
    }

    /// Dispatch a navigation query by kind.
    pub async fn navigate(
        &self,
        kind: NavigationKind,
        frame_number: FrameNumber,
        direction: Direction,
    ) -> Result<NavigationOutcome, sqlx::Error> {
        match kind {
            NavigationKind::Error => self.find_error(frame_number, direction).await,
            NavigationKind::Ok => self.find_ok(frame_number, direction).await,
            NavigationKind::Ai => self.find_ai(frame_number, direction).await,
            NavigationKind::Rejection => Ok(self.find_rejection(frame_number, direction)),
        }
    }

    /// Close the pool. Pending queries complete first.
    /// Run a trivial query against the pool.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

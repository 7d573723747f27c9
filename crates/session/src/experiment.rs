//! An experiment on disk and the state held while it is active.

use std::path::{Path, PathBuf};

use serde::Serialize;
use trackval_core::chunk::ChunkAddress;
use trackval_core::frame_guard::FrameGuard;
use trackval_core::frame_store::ChunkSource;
use trackval_core::metadata::ExperimentMetadata;
use trackval_core::naming;
use trackval_core::segmentation::SegmentationParams;
use trackval_core::types::{FrameNumber, Timestamp};
use trackval_db::models::tracking::TrackedDetection;
use trackval_db::{AnnotationIndex, SchemaVariant};

/// Location of one experiment under the videos root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Experiment {
    /// Canonical key, e.g. `FlyHostel1/5X/2023-05-23_14-00-00`.
    pub key: String,
    pub slug: String,
    pub directory: PathBuf,
    pub database_path: PathBuf,
}

impl Experiment {
    pub fn locate(videos_root: &Path, key: &str) -> Self {
        let directory = videos_root.join(key);
        let database_path = directory.join(naming::database_file_name(key));
        Self {
            key: key.to_string(),
            slug: naming::experiment_slug(key),
            directory,
            database_path,
        }
    }
}

/// Everything loaded for the active experiment.
pub struct ActiveExperiment<S: ChunkSource> {
    pub experiment: Experiment,
    pub metadata: ExperimentMetadata,
    pub params: SegmentationParams,
    pub frames: FrameGuard<S>,
    pub index: AnnotationIndex,
}

impl<S: ChunkSource> ActiveExperiment<S> {
    pub fn summary(&self) -> ActiveSummary {
        let tables = self.index.tables();
        ActiveSummary {
            key: self.experiment.key.clone(),
            slug: self.experiment.slug.clone(),
            schema_variant: tables.variant,
            metadata: self.metadata,
            number_of_animals: self.params.number_of_animals,
            has_ai: tables.has_ai,
            rejections: self.index.rejections().len(),
        }
    }

    /// First frame of `chunk_index`.
    pub fn chunk_start(&self, chunk_index: i64) -> FrameNumber {
        ChunkAddress {
            chunk_index,
            offset: 0,
        }
        .frame_number(self.metadata.chunk_size)
    }

    /// Release the decoder and close the database pool.
    pub async fn close(&self) {
        self.frames.release().await;
        self.index.close().await;
    }
}

/// Public description of the active experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSummary {
    pub key: String,
    pub slug: String,
    pub schema_variant: SchemaVariant,
    pub metadata: ExperimentMetadata,
    pub number_of_animals: u32,
    pub has_ai: bool,
    pub rejections: usize,
}

/// A tracked detection with its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingRow {
    #[serde(flatten)]
    pub detection: TrackedDetection,
    pub t: Timestamp,
}

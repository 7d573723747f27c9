//! The experiment registry.
//!
//! [`ExperimentRegistry`] owns the single active experiment: its frame store
//! (behind a [`FrameGuard`]), its annotation index, tracking configuration and
//! rejection list. It is created once at startup and shared through an `Arc`.
//!
//! Every per-experiment operation names the experiment it expects. A request
//! for any experiment other than the active one fails with
//! [`SessionError::ExperimentNotActive`]; requests never switch implicitly.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use trackval_core::chunk::DEFAULT_CHUNK_EXTENSION;
use trackval_core::encoding::DEFAULT_JPEG_QUALITY;
use trackval_core::error::CoreError;
use trackval_core::frame_guard::{FrameContours, FrameGuard, ServedFrame};
use trackval_core::frame_store::{ChunkSource, FrameStore, StoreLayout};
use trackval_core::metadata::ExperimentMetadata;
use trackval_core::naming::{self, DEFAULT_DATE_CUTOFF};
use trackval_core::navigation::{Direction, NavigationKind, NavigationOutcome, RejectionList};
use trackval_core::segmentation::{SegmentationParams, Segmenter, FIELD_TRACKING_CONFIG};
use trackval_core::types::FrameNumber;
use trackval_db::models::concatenation::ConcatenationLink;
use trackval_db::models::metadata::MetadataEntry;
use trackval_db::AnnotationIndex;

use crate::error::SessionError;
use crate::experiment::{ActiveExperiment, ActiveSummary, Experiment, TrackingRow};

/// File under the videos root listing every experiment database.
pub const INDEX_FILE: &str = "index.txt";

/// Chunk warmed after a switch unless configured otherwise.
pub const DEFAULT_WARM_CHUNK: i64 = 50;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub videos_root: PathBuf,
    pub chunk_extension: String,
    /// Experiments recorded before this date are not listed.
    pub date_cutoff: NaiveDate,
    /// Chunk whose first frame is decoded right after a switch.
    pub warm_chunk: Option<i64>,
    pub jpeg_quality: u8,
    pub db_max_connections: u32,
}

impl RegistryConfig {
    pub fn new(videos_root: impl Into<PathBuf>) -> Self {
        Self {
            videos_root: videos_root.into(),
            chunk_extension: DEFAULT_CHUNK_EXTENSION.to_string(),
            date_cutoff: NaiveDate::parse_from_str(DEFAULT_DATE_CUTOFF, "%Y-%m-%d")
                .unwrap_or(NaiveDate::MIN),
            warm_chunk: Some(DEFAULT_WARM_CHUNK),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            db_max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    AlreadyActive,
    Switched,
}

pub struct ExperimentRegistry<S: ChunkSource + Clone> {
    config: RegistryConfig,
    source: S,
    segmenter: Arc<dyn Segmenter>,
    active: RwLock<Option<Arc<ActiveExperiment<S>>>>,
    /// Serialises switches.
    switch_lock: Mutex<()>,
}

impl<S: ChunkSource + Clone> ExperimentRegistry<S> {
    pub fn new(config: RegistryConfig, source: S, segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            config,
            source,
            segmenter,
            active: RwLock::new(None),
            switch_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Experiment keys listed in the videos root index, filtered by the date
    /// cutoff and sorted.
    pub async fn list_experiments(&self) -> Result<Vec<String>, SessionError> {
        let path = self.config.videos_root.join(INDEX_FILE);
        let index = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SessionError::IndexUnavailable(format!("{}: {e}", path.display())))?;
        Ok(naming::filter_index(&index, self.config.date_cutoff))
    }

    // -----------------------------------------------------------------------
    // Switching
    // -----------------------------------------------------------------------

    /// Make `experiment_id` the active experiment.
    ///
    /// The new experiment is fully loaded before the previous one is
    /// released, so a failed switch leaves the previous experiment usable.
    pub async fn switch_to(&self, experiment_id: &str) -> Result<SwitchOutcome, SessionError> {
        let key = naming::experiment_key(experiment_id)?;
        let _switching = self.switch_lock.lock().await;

        if self.active_key().await.as_deref() == Some(key.as_str()) {
            tracing::debug!(experiment = %key, "Experiment already active");
            return Ok(SwitchOutcome::AlreadyActive);
        }

        let next = Arc::new(self.load(&key).await?);

        let previous = self.active.write().await.replace(Arc::clone(&next));
        if let Some(previous) = previous {
            tracing::info!(experiment = %previous.experiment.key, "Releasing previous experiment");
            previous.close().await;
        }

        tracing::info!(
            experiment = %key,
            chunk_size = next.metadata.chunk_size,
            frame_rate = next.metadata.frame_rate,
            variant = next.index.tables().variant.as_str(),
            "Switched experiment"
        );

        if let Some(chunk) = self.config.warm_chunk {
            self.warm(&next, chunk).await;
        }

        Ok(SwitchOutcome::Switched)
    }

    /// Open and validate an experiment without touching the active one.
    async fn load(&self, key: &str) -> Result<ActiveExperiment<S>, SessionError> {
        let experiment = Experiment::locate(&self.config.videos_root, key);

        if !tokio::fs::try_exists(&experiment.directory).await.unwrap_or(false)
            || !tokio::fs::try_exists(&experiment.database_path).await.unwrap_or(false)
        {
            tracing::warn!(experiment = %key, path = %experiment.database_path.display(), "Experiment not found");
            return Err(CoreError::ExperimentNotFound(key.to_string()).into());
        }

        let rejections = RejectionList::load(&experiment.directory).await?;
        let index = AnnotationIndex::open(
            &experiment.database_path,
            self.config.db_max_connections,
            rejections,
        )
        .await?;

        let loaded = async {
            let entries = index.metadata_entries().await?;
            let metadata = ExperimentMetadata::from_entries(metadata_pairs(&entries))?;
            let params = tracking_config(key, &entries)?;
            Ok::<_, SessionError>((metadata, params))
        }
        .await;

        let (metadata, params) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                index.close().await;
                return Err(e);
            }
        };

        let layout = StoreLayout {
            basedir: experiment.directory.clone(),
            extension: self.config.chunk_extension.clone(),
        };
        let store = FrameStore::new(self.source.clone(), layout, metadata);
        let frames = FrameGuard::new(store).with_segmenter(Arc::clone(&self.segmenter), params.clone());

        Ok(ActiveExperiment {
            experiment,
            metadata,
            params,
            frames,
            index,
        })
    }

    async fn warm(&self, active: &ActiveExperiment<S>, chunk: i64) {
        let frame_number = active.chunk_start(chunk);
        match active.frames.serve(frame_number, self.config.jpeg_quality).await {
            Ok(served) if served.placeholder => {
                tracing::warn!(chunk, frame_number, "Warm-up frame unavailable");
            }
            Ok(_) => {
                let open_chunk = active.frames.current_chunk().await;
                tracing::debug!(chunk, frame_number, ?open_chunk, "Frame store warmed");
            }
            Err(e) => tracing::warn!(chunk, error = %e, "Frame store warm-up failed"),
        }
    }

    /// Release the active experiment, if any.
    pub async fn shutdown(&self) {
        let _switching = self.switch_lock.lock().await;
        if let Some(active) = self.active.write().await.take() {
            tracing::info!(experiment = %active.experiment.key, "Closing active experiment");
            active.close().await;
        }
    }

    // -----------------------------------------------------------------------
    // Per-experiment operations
    // -----------------------------------------------------------------------

    pub async fn active_key(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|a| a.experiment.key.clone())
    }

    pub async fn active_summary(&self) -> Option<ActiveSummary> {
        self.active.read().await.as_ref().map(|a| a.summary())
    }

    /// Whether the active experiment's database answers a query; `None` when
    /// no experiment is active.
    pub async fn database_healthy(&self) -> Option<bool> {
        let active = self.active.read().await.as_ref().map(Arc::clone)?;
        match active.index.health_check().await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!(experiment = %active.experiment.key, error = %e, "Database health check failed");
                Some(false)
            }
        }
    }

    /// The active experiment, provided it is `experiment_id`.
    async fn require(&self, experiment_id: &str) -> Result<Arc<ActiveExperiment<S>>, SessionError> {
        let key = naming::experiment_key(experiment_id)?;
        let active = self.active.read().await;
        match active.as_ref() {
            Some(a) if a.experiment.key == key => Ok(Arc::clone(a)),
            Some(a) => Err(SessionError::ExperimentNotActive {
                requested: key,
                active: Some(a.experiment.key.clone()),
            }),
            None => Err(SessionError::NoActiveExperiment),
        }
    }

    /// Decode and encode one frame. Missing frames come back as placeholders.
    pub async fn get_frame(
        &self,
        experiment_id: &str,
        frame_number: FrameNumber,
    ) -> Result<ServedFrame, SessionError> {
        let active = self.require(experiment_id).await?;
        let served = active.frames.serve(frame_number, self.config.jpeg_quality).await?;
        Ok(served)
    }

    /// Tracked detections of a frame, each stamped with the frame's timestamp.
    pub async fn tracking_at(
        &self,
        experiment_id: &str,
        frame_number: FrameNumber,
    ) -> Result<Vec<TrackingRow>, SessionError> {
        if frame_number < 0 {
            return Err(CoreError::InvalidFrameNumber(frame_number).into());
        }
        let active = self.require(experiment_id).await?;
        let t = active.metadata.timestamp(frame_number);
        let rows = active.index.tracking_at(frame_number).await?;
        Ok(rows
            .into_iter()
            .map(|detection| TrackingRow { detection, t })
            .collect())
    }

    pub async fn navigate(
        &self,
        experiment_id: &str,
        frame_number: FrameNumber,
        kind: NavigationKind,
        direction: Direction,
    ) -> Result<NavigationOutcome, SessionError> {
        let active = self.require(experiment_id).await?;
        let outcome = active.index.navigate(kind, frame_number, direction).await?;
        tracing::debug!(
            kind = kind.as_str(),
            direction = direction.as_str(),
            from = frame_number,
            to = ?outcome.frame_number(),
            "Navigation"
        );
        Ok(outcome)
    }

    /// Contours of the last real frame served for the experiment.
    pub async fn last_contours(&self, experiment_id: &str) -> Result<Option<FrameContours>, SessionError> {
        let active = self.require(experiment_id).await?;
        Ok(active.frames.last_contours().await)
    }

    pub async fn concatenation(
        &self,
        experiment_id: &str,
        chunk: i64,
    ) -> Result<Vec<ConcatenationLink>, SessionError> {
        if chunk < 0 {
            return Err(CoreError::Validation(format!("chunk must be non-negative, got {chunk}")).into());
        }
        let active = self.require(experiment_id).await?;
        Ok(active.index.concatenation_for_chunk(chunk).await?)
    }
}

fn metadata_pairs(entries: &[MetadataEntry]) -> impl Iterator<Item = (&str, &str)> {
    entries
        .iter()
        .filter_map(|e| e.value.as_deref().map(|value| (e.field.as_str(), value)))
}

fn tracking_config(key: &str, entries: &[MetadataEntry]) -> Result<SegmentationParams, CoreError> {
    let json = metadata_pairs(entries)
        .find(|(field, _)| *field == FIELD_TRACKING_CONFIG)
        .map(|(_, value)| value)
        .ok_or_else(|| CoreError::ConfigMissing {
            experiment: key.to_string(),
            reason: format!("METADATA has no '{FIELD_TRACKING_CONFIG}' entry"),
        })?;
    SegmentationParams::from_config_json(key, json)
}

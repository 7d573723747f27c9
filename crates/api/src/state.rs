use std::sync::Arc;

use trackval_core::ffmpeg::FfmpegChunkSource;
use trackval_session::ExperimentRegistry;

use crate::config::ServerConfig;

/// The registry type served over HTTP: chunks decoded by ffmpeg.
pub type Registry = ExperimentRegistry<FfmpegChunkSource>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The active-experiment session.
    pub registry: Arc<Registry>,
    pub config: Arc<ServerConfig>,
}

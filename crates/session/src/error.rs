use trackval_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Experiment {requested} is not active (active: {})", .active.as_deref().unwrap_or("none"))]
    ExperimentNotActive {
        requested: String,
        active: Option<String>,
    },

    #[error("No experiment is active")]
    NoActiveExperiment,

    #[error("Experiment index unavailable: {0}")]
    IndexUnavailable(String),
}

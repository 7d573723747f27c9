use crate::types::FrameNumber;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid frame number: {0}")]
    InvalidFrameNumber(FrameNumber),

    #[error("Frame {frame_number} not found: {reason}")]
    FrameNotFound {
        frame_number: FrameNumber,
        reason: String,
    },

    #[error("Experiment not found: {0}")]
    ExperimentNotFound(String),

    #[error("Tracking configuration missing for {experiment}: {reason}")]
    ConfigMissing { experiment: String, reason: String },

    #[error("Invalid experiment metadata: {0}")]
    InvalidMetadata(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

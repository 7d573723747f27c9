use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use trackval_core::error::CoreError;
use trackval_session::SessionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`SessionError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Session(session) => match session {
                SessionError::Core(core) => classify_core_error(core),
                SessionError::Database(err) => {
                    // Experiment databases are read-only; any failure is a sanitized 500.
                    tracing::error!(error = %err, "Database error");
                    internal()
                }
                SessionError::ExperimentNotActive { .. } | SessionError::NoActiveExperiment => (
                    StatusCode::CONFLICT,
                    "EXPERIMENT_NOT_ACTIVE",
                    session.to_string(),
                ),
                SessionError::IndexUnavailable(msg) => {
                    tracing::error!(error = %msg, "Experiment index unavailable");
                    internal()
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::InvalidFrameNumber(_) | CoreError::Validation(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        CoreError::ExperimentNotFound(_) => {
            (StatusCode::NOT_FOUND, "EXPERIMENT_NOT_FOUND", err.to_string())
        }
        CoreError::FrameNotFound { .. } => {
            (StatusCode::NOT_FOUND, "FRAME_NOT_FOUND", err.to_string())
        }
        CoreError::ConfigMissing { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "CONFIG_MISSING", err.to_string())
        }
        CoreError::InvalidMetadata(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_METADATA", err.to_string())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

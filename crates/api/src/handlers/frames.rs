//! Frame image handler.
//!
//! Frames are returned as `image/jpeg`. Frame number, timestamp and whether
//! the image is a placeholder travel in response headers.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Response;
use trackval_core::types::FrameNumber;

use crate::error::{AppError, AppResult};
use crate::extract::ApiPath;
use crate::state::AppState;

pub const HEADER_FRAME_NUMBER: &str = "x-frame-number";
pub const HEADER_FRAME_TIMESTAMP: &str = "x-frame-timestamp";
pub const HEADER_FRAME_PLACEHOLDER: &str = "x-frame-placeholder";

/// GET /api/v1/experiments/{experiment}/frames/{frame}
pub async fn get_frame(
    State(state): State<AppState>,
    ApiPath((experiment, frame_number)): ApiPath<(String, FrameNumber)>,
) -> AppResult<Response> {
    let served = state.registry.get_frame(&experiment, frame_number).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, served.jpeg.len().to_string())
        .header(header::CACHE_CONTROL, "no-store")
        .header(HEADER_FRAME_NUMBER, served.frame_number.to_string())
        .header(HEADER_FRAME_TIMESTAMP, served.timestamp.to_string())
        .header(HEADER_FRAME_PLACEHOLDER, served.placeholder.to_string())
        .body(Body::from(served.jpeg))
        .map_err(|e| AppError::InternalError(format!("failed to build frame response: {e}")))
}

//! Handlers for per-frame annotations.

use axum::extract::State;
use axum::Json;
use trackval_core::frame_guard::FrameContours;
use trackval_core::types::FrameNumber;
use trackval_db::models::concatenation::ConcatenationLink;
use trackval_session::TrackingRow;

use crate::error::AppResult;
use crate::extract::ApiPath;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/experiments/{experiment}/tracking/{frame}
pub async fn get_tracking(
    State(state): State<AppState>,
    ApiPath((experiment, frame_number)): ApiPath<(String, FrameNumber)>,
) -> AppResult<Json<DataResponse<Vec<TrackingRow>>>> {
    let rows = state.registry.tracking_at(&experiment, frame_number).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/experiments/{experiment}/contours
pub async fn get_contours(
    State(state): State<AppState>,
    ApiPath(experiment): ApiPath<String>,
) -> AppResult<Json<DataResponse<Option<FrameContours>>>> {
    let contours = state.registry.last_contours(&experiment).await?;
    Ok(Json(DataResponse { data: contours }))
}

/// GET /api/v1/experiments/{experiment}/concatenation/{chunk}
pub async fn get_concatenation(
    State(state): State<AppState>,
    ApiPath((experiment, chunk)): ApiPath<(String, i64)>,
) -> AppResult<Json<DataResponse<Vec<ConcatenationLink>>>> {
    let links = state.registry.concatenation(&experiment, chunk).await?;
    Ok(Json(DataResponse { data: links }))
}

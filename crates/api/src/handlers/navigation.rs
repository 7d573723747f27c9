//! Directional navigation handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use trackval_core::navigation::{Direction, NavigationKind, NavigationOutcome};
use trackval_core::types::FrameNumber;

use crate::error::AppResult;
use crate::extract::ApiPath;
use crate::response::DataResponse;
use crate::state::AppState;

/// Navigation result. `frame_number` is `null` when nothing qualifies.
#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub frame_number: Option<FrameNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<NavigationOutcome> for NavigationResponse {
    fn from(outcome: NavigationOutcome) -> Self {
        match outcome {
            NavigationOutcome::Found(hit) => Self {
                frame_number: Some(hit.frame_number),
                label: hit.label,
            },
            NavigationOutcome::Exhausted => Self {
                frame_number: None,
                label: None,
            },
        }
    }
}

/// GET /api/v1/experiments/{experiment}/navigate/{kind}/{direction}/{frame}
pub async fn navigate(
    State(state): State<AppState>,
    ApiPath((experiment, kind, direction, frame_number)): ApiPath<(
        String,
        String,
        String,
        FrameNumber,
    )>,
) -> AppResult<Json<DataResponse<NavigationResponse>>> {
    let kind = NavigationKind::parse(&kind)?;
    let direction = Direction::parse(&direction)?;

    let outcome = state
        .registry
        .navigate(&experiment, frame_number, kind, direction)
        .await?;

    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}

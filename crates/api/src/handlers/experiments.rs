//! Handlers for the experiment catalog and the active experiment.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use trackval_session::{ActiveSummary, SwitchOutcome};

use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub experiment: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    /// `switched` or `already_active`.
    pub outcome: &'static str,
    pub active: Option<ActiveSummary>,
}

/// GET /api/v1/experiments
pub async fn list_experiments(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let experiments = state.registry.list_experiments().await?;
    Ok(Json(DataResponse { data: experiments }))
}

/// GET /api/v1/experiments/active
pub async fn get_active(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<ActiveSummary>>>> {
    Ok(Json(DataResponse {
        data: state.registry.active_summary().await,
    }))
}

/// PUT /api/v1/experiments/active
pub async fn switch_active(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SwitchRequest>,
) -> AppResult<Json<DataResponse<SwitchResponse>>> {
    if input.experiment.trim().is_empty() {
        return Err(AppError::BadRequest("experiment must not be empty".into()));
    }

    let outcome = state.registry.switch_to(&input.experiment).await?;
    let outcome = match outcome {
        SwitchOutcome::Switched => "switched",
        SwitchOutcome::AlreadyActive => "already_active",
    };

    Ok(Json(DataResponse {
        data: SwitchResponse {
            outcome,
            active: state.registry.active_summary().await,
        },
    }))
}

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Key of the active experiment, if any.
    pub active_experiment: Option<String>,
    /// `ok` or `unavailable` for the active experiment's database; `null`
    /// when no experiment is active.
    pub database: Option<&'static str>,
}

/// GET /health -- returns service health and the active experiment.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state
        .registry
        .database_healthy()
        .await
        .map(|healthy| if healthy { "ok" } else { "unavailable" });

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        active_experiment: state.registry.active_key().await,
        database,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

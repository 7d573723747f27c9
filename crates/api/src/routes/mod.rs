pub mod experiments;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /experiments                                        list
/// /experiments/active                                 get, switch (PUT)
/// /experiments/{experiment}/frames/{frame}            JPEG frame
/// /experiments/{experiment}/tracking/{frame}          detections of a frame
/// /experiments/{experiment}/navigate/{kind}/{direction}/{frame}
/// /experiments/{experiment}/contours                  contours of the last frame
/// /experiments/{experiment}/concatenation/{chunk}     identity links of a chunk
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/experiments", experiments::router())
}

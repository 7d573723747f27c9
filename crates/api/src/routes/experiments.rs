//! Route definitions for experiments and their frames and annotations.
//!
//! Mounted at `/experiments`. `{experiment}` accepts both the canonical key
//! (URL-encoded) and the slug form `FlyHostel1_5X_2023-05-23_14-00-00`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{experiments, frames, navigation, tracking};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(experiments::list_experiments))
        .route(
            "/active",
            get(experiments::get_active).put(experiments::switch_active),
        )
        .route("/{experiment}/frames/{frame}", get(frames::get_frame))
        .route("/{experiment}/tracking/{frame}", get(tracking::get_tracking))
        .route(
            "/{experiment}/navigate/{kind}/{direction}/{frame}",
            get(navigation::navigate),
        )
        .route("/{experiment}/contours", get(tracking::get_contours))
        .route(
            "/{experiment}/concatenation/{chunk}",
            get(tracking::get_concatenation),
        )
}

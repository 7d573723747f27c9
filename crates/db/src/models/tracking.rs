//! Tracked detections joined with their identity assignment.

use serde::Serialize;
use sqlx::FromRow;
use trackval_core::types::FrameNumber;

/// One detection in a frame, with its identity when one was assigned.
///
/// `identity` is `None` when no IDENTITY row matches the detection on
/// `(frame_number, in_frame_index)`; `Some(0)` means assignment failed.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TrackedDetection {
    pub frame_number: FrameNumber,
    pub in_frame_index: i64,
    pub x: f64,
    pub y: f64,
    pub area: i64,
    pub modified: bool,
    pub fragment: Option<i64>,
    pub identity: Option<i64>,
    pub local_identity: Option<i64>,
}

use serde::Serialize;
use sqlx::FromRow;
use trackval_core::types::FrameNumber;

/// A classifier verdict from the `AI` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct AiLabel {
    pub frame_number: FrameNumber,
    pub label: Option<String>,
}

use serde::Serialize;
use sqlx::FromRow;

/// A row from the `METADATA` key/value table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MetadataEntry {
    pub field: String,
    pub value: Option<String>,
}

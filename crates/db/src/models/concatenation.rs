//! Identity links between consecutive chunks.

use serde::Serialize;
use sqlx::FromRow;
use trackval_core::types::DbId;

/// A row from the `CONCATENATION` table.
///
/// Maps a local identity inside `chunk` to the local identity it continues as
/// in the next chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ConcatenationLink {
    pub id: DbId,
    pub chunk: i64,
    pub local_identity: Option<i64>,
    pub local_identity_after: Option<i64>,
    pub is_inferred: bool,
    pub is_broken: bool,
}

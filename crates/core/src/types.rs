/// SQLite `INTEGER PRIMARY KEY` values.
pub type DbId = i64;

/// Global frame number, counted across all chunks of a recording.
pub type FrameNumber = i64;

/// Seconds relative to the experiment's reference hour.
pub type Timestamp = f64;

//! Per-experiment metadata derived from the `METADATA` key/value table.
//!
//! The table stores everything as text. The fields consumed here are:
//!
//! | Field                | Content                                          |
//! |----------------------|--------------------------------------------------|
//! | `chunksize`          | frames per chunk file (numeric text)             |
//! | `framerate`          | frames per second (numeric text)                 |
//! | `date_time`          | recording start, Unix seconds (numeric text)     |
//! | `ethoscope_metadata` | CSV with a `reference_hour` column (optional)    |

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{FrameNumber, Timestamp};

pub const FIELD_CHUNK_SIZE: &str = "chunksize";
pub const FIELD_FRAME_RATE: &str = "framerate";
pub const FIELD_DATE_TIME: &str = "date_time";
pub const FIELD_ETHOSCOPE_METADATA: &str = "ethoscope_metadata";

const SECONDS_PER_DAY: i64 = 24 * 3600;
const REFERENCE_HOUR_COLUMN: &str = "reference_hour";

/// Timing and layout constants of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExperimentMetadata {
    /// Seconds between the reference hour and the start of the recording.
    pub epoch_offset_seconds: i64,
    pub chunk_size: i64,
    pub frame_rate: i64,
}

impl ExperimentMetadata {
    /// Build metadata from already-parsed values, enforcing the invariants.
    pub fn new(epoch_offset_seconds: i64, chunk_size: i64, frame_rate: i64) -> Result<Self, CoreError> {
        if chunk_size <= 0 {
            return Err(CoreError::InvalidMetadata(format!(
                "chunksize must be positive, got {chunk_size}"
            )));
        }
        if frame_rate <= 0 {
            return Err(CoreError::InvalidMetadata(format!(
                "framerate must be positive, got {frame_rate}"
            )));
        }
        Ok(Self {
            epoch_offset_seconds,
            chunk_size,
            frame_rate,
        })
    }

    /// Parse the metadata from the raw `(field, value)` rows.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields: HashMap<&str, &str> = entries.into_iter().collect();

        let chunk_size = parse_integer_field(&fields, FIELD_CHUNK_SIZE)?;
        let frame_rate = parse_integer_field(&fields, FIELD_FRAME_RATE)?;
        let start = parse_integer_field(&fields, FIELD_DATE_TIME)?.rem_euclid(SECONDS_PER_DAY);

        let reference_hour = match fields.get(FIELD_ETHOSCOPE_METADATA) {
            Some(text) => parse_reference_hour(text)?,
            None => 0.0,
        };
        let reference_seconds = (reference_hour * 3600.0).round() as i64;

        Self::new(start - reference_seconds, chunk_size, frame_rate)
    }

    /// Seconds since the reference hour at which `frame_number` was recorded.
    pub fn timestamp(&self, frame_number: FrameNumber) -> Timestamp {
        frame_number as f64 / self.frame_rate as f64 + self.epoch_offset_seconds as f64
    }
}

/// Parse a numeric text field, truncating any fractional part (`"45000.0"`).
fn parse_integer_field(fields: &HashMap<&str, &str>, field: &str) -> Result<i64, CoreError> {
    let raw = fields
        .get(field)
        .ok_or_else(|| CoreError::InvalidMetadata(format!("missing field '{field}'")))?;
    parse_truncated(raw)
        .ok_or_else(|| CoreError::InvalidMetadata(format!("field '{field}' is not numeric: '{raw}'")))
}

fn parse_truncated(raw: &str) -> Option<i64> {
    let value = raw.trim().parse::<f64>().ok()?;
    if value.is_finite() {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

/// Extract the single `reference_hour` shared by every row of the ethoscope CSV.
///
/// The first column is an unnamed index. Cells may be quoted and contain
/// commas. The hour may be fractional.
fn parse_reference_hour(text: &str) -> Result<f64, CoreError> {
    let invalid = |reason: String| CoreError::InvalidMetadata(format!("ethoscope metadata: {reason}"));

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let column = reader
        .headers()
        .map_err(|e| invalid(e.to_string()))?
        .iter()
        .position(|name| name == REFERENCE_HOUR_COLUMN)
        .ok_or_else(|| invalid(format!("no '{REFERENCE_HOUR_COLUMN}' column")))?;

    let mut reference_hour: Option<f64> = None;
    for record in reader.records() {
        let record = record.map_err(|e| invalid(e.to_string()))?;
        let cell = record
            .get(column)
            .ok_or_else(|| invalid(format!("row is too short: {record:?}")))?;
        let hour = cell
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite())
            .ok_or_else(|| invalid(format!("reference_hour is not numeric: '{cell}'")))?;
        match reference_hour {
            None => reference_hour = Some(hour),
            Some(previous) if previous != hour => {
                return Err(invalid(format!(
                    "rows disagree on reference_hour ({previous} vs {hour})"
                )));
            }
            Some(_) => {}
        }
    }

    reference_hour.ok_or_else(|| invalid("no data rows".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ETHOSCOPE_CSV: &str = ",machine_name,reference_hour,date\n0,ETHOSCOPE_001,11.0,2023-05-23\n1,ETHOSCOPE_001,11.0,2023-05-23\n";

    fn entries<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut rows = vec![("chunksize", "45000.0"), ("framerate", "150"), ("date_time", "1684850400.25")];
        rows.extend_from_slice(extra);
        rows
    }

    #[test]
    fn parses_numeric_fields_with_fraction() {
        let meta = ExperimentMetadata::from_entries(entries(&[])).unwrap();
        assert_eq!(meta.chunk_size, 45000);
        assert_eq!(meta.frame_rate, 150);
        // 1684850400 % 86400 == 50400 (14:00 UTC)
        assert_eq!(meta.epoch_offset_seconds, 50400);
    }

    #[test]
    fn offset_subtracts_reference_hour() {
        let meta =
            ExperimentMetadata::from_entries(entries(&[("ethoscope_metadata", ETHOSCOPE_CSV)])).unwrap();
        assert_eq!(meta.epoch_offset_seconds, 50400 - 11 * 3600);
    }

    #[test]
    fn timestamp_uses_frame_rate_and_offset() {
        let meta = ExperimentMetadata::new(100, 45000, 150).unwrap();
        assert!((meta.timestamp(0) - 100.0).abs() < 1e-9);
        assert!((meta.timestamp(300) - 102.0).abs() < 1e-9);
        assert!((meta.timestamp(75) - 100.5).abs() < 1e-9);
    }

    #[test]
    fn missing_chunk_size_is_rejected() {
        let rows = vec![("framerate", "150"), ("date_time", "0")];
        assert_matches!(
            ExperimentMetadata::from_entries(rows),
            Err(CoreError::InvalidMetadata(msg)) if msg.contains("chunksize")
        );
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        let rows = vec![("chunksize", "45000"), ("framerate", "0"), ("date_time", "0")];
        assert_matches!(ExperimentMetadata::from_entries(rows), Err(CoreError::InvalidMetadata(_)));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let rows = vec![("chunksize", "lots"), ("framerate", "150"), ("date_time", "0")];
        assert_matches!(ExperimentMetadata::from_entries(rows), Err(CoreError::InvalidMetadata(_)));
    }

    #[test]
    fn quoted_cells_with_commas_are_parsed() {
        let csv = ",machine_name,comment,reference_hour\n0,ETHOSCOPE_001,\"fed, wet\",11.0\n";
        let meta = ExperimentMetadata::from_entries(entries(&[("ethoscope_metadata", csv)])).unwrap();
        assert_eq!(meta.epoch_offset_seconds, 50400 - 11 * 3600);
    }

    #[test]
    fn fractional_reference_hour_keeps_minutes() {
        let csv = ",reference_hour\n0,11.5\n1,11.5\n";
        let meta = ExperimentMetadata::from_entries(entries(&[("ethoscope_metadata", csv)])).unwrap();
        assert_eq!(meta.epoch_offset_seconds, 50400 - 41400);
    }

    #[test]
    fn disagreeing_reference_hours_are_rejected() {
        let csv = ",reference_hour\n0,11\n1,12\n";
        assert_matches!(
            ExperimentMetadata::from_entries(entries(&[("ethoscope_metadata", csv)])),
            Err(CoreError::InvalidMetadata(_))
        );
    }

    #[test]
    fn ethoscope_csv_without_column_is_rejected() {
        let csv = ",machine_name\n0,ETHOSCOPE_001\n";
        assert_matches!(
            ExperimentMetadata::from_entries(entries(&[("ethoscope_metadata", csv)])),
            Err(CoreError::InvalidMetadata(_))
        );
    }
}

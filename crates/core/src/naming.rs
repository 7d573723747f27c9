//! Experiment naming conventions.
//!
//! Experiments live at `<videos root>/<host>/<magnification>/<date_time>`,
//! e.g. `FlyHostel1/5X/2023-05-23_14-00-00`. That three-component path is the
//! canonical experiment key. URLs carry the flattened slug form
//! `FlyHostel1_5X_2023-05-23_14-00-00`, which is also the stem of the
//! experiment's database file.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::CoreError;

/// Database file names that identify a tracked experiment.
static DATABASE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^FlyHostel\d_\d{1,2}X_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}\.db$")
        .expect("database name pattern is valid")
});

/// Default earliest experiment date shown in listings.
pub const DEFAULT_DATE_CUTOFF: &str = "2023-05-23";

/// Normalise an experiment identifier to its canonical key.
///
/// ```
/// use trackval_core::naming::experiment_key;
///
/// assert_eq!(
///     experiment_key("FlyHostel1_5X_2023-05-23_14-00-00").unwrap(),
///     "FlyHostel1/5X/2023-05-23_14-00-00"
/// );
/// assert_eq!(
///     experiment_key("FlyHostel1/5X/2023-05-23_14-00-00").unwrap(),
///     "FlyHostel1/5X/2023-05-23_14-00-00"
/// );
/// ```
pub fn experiment_key(identifier: &str) -> Result<String, CoreError> {
    let identifier = identifier.trim().trim_matches('/');
    let invalid = || CoreError::Validation(format!("Invalid experiment identifier '{identifier}'"));

    if identifier.contains("..") || identifier.contains('\\') {
        return Err(invalid());
    }

    let parts: Vec<&str> = if identifier.contains('/') {
        identifier.split('/').collect()
    } else {
        let tokens: Vec<&str> = identifier.split('_').collect();
        if tokens.len() != 4 {
            return Err(invalid());
        }
        vec![tokens[0], tokens[1], &identifier[tokens[0].len() + tokens[1].len() + 2..]]
    };

    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

/// Database file name of an experiment: the key with `/` replaced by `_`.
///
/// ```
/// use trackval_core::naming::database_file_name;
///
/// assert_eq!(
///     database_file_name("FlyHostel1/5X/2023-05-23_14-00-00"),
///     "FlyHostel1_5X_2023-05-23_14-00-00.db"
/// );
/// ```
pub fn database_file_name(key: &str) -> String {
    format!("{}.db", key.replace('/', "_"))
}

/// URL slug of an experiment key.
pub fn experiment_slug(key: &str) -> String {
    key.replace('/', "_")
}

/// Recording date encoded in the first ten characters of the key's last component.
pub fn experiment_date(key: &str) -> Option<NaiveDate> {
    let last = key.rsplit('/').next()?;
    let date = last.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Parse a `YYYY-MM-DD` cutoff date.
pub fn parse_cutoff(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| CoreError::Validation(format!("invalid cutoff date '{value}': {e}")))
}

/// Turn the lines of the videos-root `index.txt` into sorted experiment keys.
///
/// Each line is a path to an experiment database. Lines whose file name does
/// not follow the experiment naming pattern are ignored, as are experiments
/// recorded before `cutoff`.
pub fn filter_index(index: &str, cutoff: NaiveDate) -> Vec<String> {
    let mut keys: Vec<String> = index
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let components: Vec<&str> = line.split('/').filter(|c| !c.is_empty()).collect();
            let (file_name, dirs) = components.split_last()?;
            if !DATABASE_NAME_RE.is_match(file_name) || dirs.len() < 3 {
                return None;
            }
            Some(dirs[dirs.len() - 3..].join("/"))
        })
        .filter(|key| experiment_date(key).is_some_and(|date| date >= cutoff))
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

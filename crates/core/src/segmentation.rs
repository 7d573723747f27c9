//! Tracking configuration and the segmentation seam.
//!
//! Each experiment database carries the idtracker.ai configuration it was
//! tracked with, as JSON under the `idtrackerai_conf` METADATA field. The
//! segmentation algorithm itself is external: it is plugged in through
//! [`Segmenter`] and fed the parameters parsed here.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// METADATA field holding the tracking configuration JSON.
pub const FIELD_TRACKING_CONFIG: &str = "idtrackerai_conf";

/// A single contour as a closed polygon of `[x, y]` pixel coordinates.
pub type Contour = Vec<[i64; 2]>;

/// `{"value": ...}` wrapper used by every entry of the configuration file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigValue<T> {
    value: T,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTrackingConfig {
    #[serde(rename = "_number_of_animals")]
    number_of_animals: ConfigValue<f64>,
    #[serde(rename = "_intensity")]
    intensity: ConfigValue<[f64; 2]>,
    #[serde(rename = "_area")]
    area: ConfigValue<[f64; 2]>,
    #[serde(rename = "_roi", default)]
    roi: Option<ConfigValue<Vec<Vec<String>>>>,
    #[serde(rename = "_resreduct", default)]
    resolution_reduction: Option<ConfigValue<f64>>,
}

/// Segmentation parameters of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationParams {
    pub number_of_animals: u32,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub min_area: f64,
    pub max_area: f64,
    /// Region of interest; `None` means the whole frame.
    pub roi: Option<Contour>,
    pub resolution_reduction: f64,
}

impl SegmentationParams {
    /// Parse the configuration JSON stored in METADATA.
    pub fn from_config_json(experiment: &str, json: &str) -> Result<Self, CoreError> {
        let missing = |reason: String| CoreError::ConfigMissing {
            experiment: experiment.to_string(),
            reason,
        };

        let raw: RawTrackingConfig =
            serde_json::from_str(json.trim_end()).map_err(|e| missing(e.to_string()))?;

        let roi = match raw.roi.as_ref().and_then(|r| r.value.first()).and_then(|r| r.first()) {
            Some(polygon) => Some(parse_roi_polygon(polygon).map_err(missing)?),
            None => None,
        };

        if raw.number_of_animals.value < 0.0 {
            return Err(missing("number of animals is negative".into()));
        }

        Ok(Self {
            number_of_animals: raw.number_of_animals.value as u32,
            min_threshold: raw.intensity.value[0],
            max_threshold: raw.intensity.value[1],
            min_area: raw.area.value[0],
            max_area: raw.area.value[1],
            roi,
            resolution_reduction: raw.resolution_reduction.map(|r| r.value).unwrap_or(1.0),
        })
    }
}

/// The ROI is stored as the text of a nested list, `"[[x, y], [x, y], ...]"`.
fn parse_roi_polygon(text: &str) -> Result<Contour, String> {
    let points: Vec<[f64; 2]> =
        serde_json::from_str(text).map_err(|e| format!("invalid ROI polygon '{text}': {e}"))?;
    if points.len() < 3 {
        return Err(format!("ROI polygon needs at least 3 points, got {}", points.len()));
    }
    Ok(points.into_iter().map(|[x, y]| [x.round() as i64, y.round() as i64]).collect())
}

/// Contour detection on a decoded frame.
///
/// Implementations must be pure with respect to the frame: the same frame and
/// parameters always yield the same contours.
pub trait Segmenter: Send + Sync {
    fn segment(&self, frame: &RgbImage, params: &SegmentationParams) -> Vec<Contour>;
}

/// Segmenter used when no segmentation backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSegmentation;

impl Segmenter for NoSegmentation {
    fn segment(&self, _frame: &RgbImage, _params: &SegmentationParams) -> Vec<Contour> {
        Vec::new()
    }
}

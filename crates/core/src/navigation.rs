//! Directional nearest-match navigation types and the rejection list.
//!
//! Every navigation query answers "which is the closest frame strictly
//! after / strictly before `f` that satisfies some predicate". When there is
//! none the answer is [`NavigationOutcome::Exhausted`], which is a normal
//! result and never an error.

use std::path::Path;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::FrameNumber;

/// File, inside the experiment directory, listing rejection start frames.
pub const REJECTIONS_FILE: &str = "rejections.txt";

// ---------------------------------------------------------------------------
// Direction / kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }

    /// Parse a direction; `prev` is accepted as a short form of `previous`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            _ => Err(CoreError::Validation(format!(
                "direction must be either 'next' or 'previous', got '{s}'"
            ))),
        }
    }
}

/// What a navigation query is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// A frame with at least one failed identity assignment.
    Error,
    /// A frame whose detections all resolved to a nonzero identity.
    Ok,
    /// A frame carrying an AI classifier verdict.
    Ai,
    /// The start of a precomputed rejection event.
    Rejection,
}

const VALID_KINDS: &[&str] = &["error", "ok", "ai", "rejection"];

impl NavigationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Ok => "ok",
            Self::Ai => "ai",
            Self::Rejection => "rejection",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "error" => Ok(Self::Error),
            "ok" => Ok(Self::Ok),
            "ai" => Ok(Self::Ai),
            "rejection" => Ok(Self::Rejection),
            _ => Err(CoreError::Validation(format!(
                "Invalid navigation kind '{s}'. Must be one of: {}",
                VALID_KINDS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationHit {
    pub frame_number: FrameNumber,
    /// Classifier label, only set for [`NavigationKind::Ai`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Found(NavigationHit),
    /// No qualifying frame exists in the requested direction.
    Exhausted,
}

impl NavigationOutcome {
    pub fn frame(frame_number: FrameNumber) -> Self {
        Self::Found(NavigationHit {
            frame_number,
            label: None,
        })
    }

    pub fn from_frame(frame_number: Option<FrameNumber>) -> Self {
        frame_number.map_or(Self::Exhausted, Self::frame)
    }

    pub fn frame_number(&self) -> Option<FrameNumber> {
        match self {
            Self::Found(hit) => Some(hit.frame_number),
            Self::Exhausted => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Found(hit) => hit.label.as_deref(),
            Self::Exhausted => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection list
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated start frames of rejection events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionList {
    frames: Vec<FrameNumber>,
}

impl RejectionList {
    pub fn new(mut frames: Vec<FrameNumber>) -> Self {
        frames.sort_unstable();
        frames.dedup();
        Self { frames }
    }

    /// Parse the text format: one frame number per line, `#` starts a comment.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut frames = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let frame = line.parse::<FrameNumber>().map_err(|_| {
                CoreError::Validation(format!(
                    "rejection list line {}: '{line}' is not a frame number",
                    lineno + 1
                ))
            })?;
            if frame < 0 {
                return Err(CoreError::InvalidFrameNumber(frame));
            }
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    /// Load the list from an experiment directory. A missing file is an empty list.
    pub async fn load(experiment_dir: &Path) -> Result<Self, CoreError> {
        let path = experiment_dir.join(REJECTIONS_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No rejection list");
                Ok(Self::default())
            }
            Err(e) => Err(CoreError::Internal(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Nearest rejection strictly after / before `frame_number`.
    pub fn find(&self, frame_number: FrameNumber, direction: Direction) -> NavigationOutcome {
        let hit = match direction {
            Direction::Next => {
                let idx = self.frames.partition_point(|&f| f <= frame_number);
                self.frames.get(idx).copied()
            }
            Direction::Previous => {
                let idx = self.frames.partition_point(|&f| f < frame_number);
                idx.checked_sub(1).map(|i| self.frames[i])
            }
        };
        NavigationOutcome::from_frame(hit)
    }
}

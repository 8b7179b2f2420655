//! Aspect ratio classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum distance from a target ratio that still counts as a match.
pub const ASPECT_TOLERANCE: f64 = 0.01;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Coarse orientation of a video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClassification {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    /// Anything else
    Other,
}

impl AspectClassification {
    /// Classify a frame size. Never fails; degenerate sizes map to `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::Other;
        }

        let ratio = width as f64 / height as f64;
        if (ratio - LANDSCAPE_RATIO).abs() < ASPECT_TOLERANCE {
            Self::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < ASPECT_TOLERANCE {
            Self::Portrait
        } else {
            Self::Other
        }
    }

    /// Key prefix for this classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AspectClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`AspectClassification::from_dimensions`].
pub fn classify(width: u32, height: u32) -> AspectClassification {
    AspectClassification::from_dimensions(width, height)
}

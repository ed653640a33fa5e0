//! Gaze sample types shared by the filter chain, the accuracy estimator and
//! the boundary adapter.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One (x, y) gaze observation in screen units with a millisecond timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Horizontal screen position
    pub x: f64,
    /// Vertical screen position
    pub y: f64,
    /// Timestamp in milliseconds (monotonic, engine clock)
    pub timestamp: f64,
}

/// Unfiltered reading from the gaze engine
pub type RawSample = GazeSample;

/// Output of the full filter chain for one tick
pub type FilteredSample = GazeSample;

impl GazeSample {
    /// Create a new sample
    #[must_use]
    pub const fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self { x, y, timestamp }
    }

    /// Screen position of the sample
    #[must_use]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Same timestamp, different position
    #[must_use]
    pub fn with_position(&self, position: Point2<f64>) -> Self {
        Self::new(position.x, position.y, self.timestamp)
    }

    /// Euclidean distance from this sample to a screen point
    #[must_use]
    pub fn distance_to(&self, point: &Point2<f64>) -> f64 {
        nalgebra::distance(&self.position(), point)
    }
}

/// Screen viewport the calibration targets are laid out on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in screen units
    pub width: f64,
    /// Height in screen units
    pub height: f64,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre of the viewport, where the centre calibration point sits
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_VIEWPORT_WIDTH,
            crate::constants::DEFAULT_VIEWPORT_HEIGHT,
        )
    }
}

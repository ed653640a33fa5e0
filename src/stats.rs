//! Summary statistics over a set of gaze samples.

use crate::sample::GazeSample;
use serde::Serialize;

/// Statistical summary of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisStatistics {
    /// Mean value of the data
    pub mean: f64,
    /// Standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the set
    pub min: f64,
    /// Maximum value in the set
    pub max: f64,
}

impl AxisStatistics {
    fn calculate(data: impl Iterator<Item = f64> + Clone, n: f64) -> Self {
        let mean = data.clone().sum::<f64>() / n;
        let variance = data.clone().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            min: data.clone().fold(f64::INFINITY, f64::min),
            max: data.fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Range (max - min) of the data
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Centroid and spread of a gaze sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointStatistics {
    /// Number of samples summarised
    pub count: usize,
    /// Horizontal statistics
    pub x: AxisStatistics,
    /// Vertical statistics
    pub y: AxisStatistics,
}

impl PointStatistics {
    /// Summarise a sample set, `None` when it is empty
    #[must_use]
    pub fn from_samples(samples: &[GazeSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;

        Some(Self {
            count: samples.len(),
            x: AxisStatistics::calculate(samples.iter().map(|s| s.x), n),
            y: AxisStatistics::calculate(samples.iter().map(|s| s.y), n),
        })
    }

    /// Average gaze position
    #[must_use]
    pub fn centroid(&self) -> (f64, f64) {
        (self.x.mean, self.y.mean)
    }

    /// Root of the summed per-axis variances
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.x.std_dev.hypot(self.y.std_dev)
    }
}

//! Gaze sample filtering stages.
//!
//! Raw gaze estimates from the engine are noisy and jump around. These stages
//! reject implausible samples and smooth the rest before anything downstream
//! (live feedback, accuracy measurement) sees them.

/// Scalar Kalman smoother and its per-axis pair
pub mod kalman;

/// Moving average over recent positions
pub mod moving_average;

/// Velocity gate for outlier rejection
pub mod velocity;

/// Distance gate around a reference point
pub mod proximity;

/// The fixed pipeline combining all stages
pub mod chain;

use crate::{constants::MAX_MOVING_AVERAGE_WINDOW, sample::GazeSample, Error, Result};
use nalgebra::Point2;

/// Trait for all gaze sample filters
pub trait GazeFilter: Send + Sync {
    /// Apply the filter; `None` rejects the sample for this tick
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample>;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl GazeFilter for NoFilter {
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample> {
        Some(sample)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_param(filter_type: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' for filter '{filter_type}'")))
}

/// Create a single filter stage from a `name[:param[:param...]]` string
///
/// Supported: `none`, `velocity[:max]`, `movingaverage[:window]`,
/// `proximity:x:y[:threshold]`, `kalman[:r:q]`.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn GazeFilter>> {
    let mut parts = filter_type.split(':');
    let name = parts.next().unwrap_or_default().to_lowercase();
    let params = parts
        .map(|p| parse_param(filter_type, p))
        .collect::<Result<Vec<f64>>>()?;

    match (name.as_str(), params.as_slice()) {
        ("none" | "nofilter", []) => Ok(Box::new(NoFilter)),
        ("velocity", []) => Ok(Box::new(velocity::VelocityGate::new(crate::constants::DEFAULT_MAX_VELOCITY))),
        ("velocity", &[max]) => {
            if max <= 0.0 || !max.is_finite() {
                return Err(Error::FilterError(format!("Max velocity must be positive, got {max}")));
            }
            Ok(Box::new(velocity::VelocityGate::new(max)))
        }
        ("movingaverage" | "moving_average", []) => Ok(Box::new(moving_average::MovingAverageFilter::new(
            crate::constants::DEFAULT_MOVING_AVERAGE_WINDOW,
        ))),
        ("movingaverage" | "moving_average", &[window]) => {
            if window < 1.0 || window.fract() != 0.0 {
                return Err(Error::FilterError(format!(
                    "Window size must be a positive integer, got {window}"
                )));
            }
            #[allow(clippy::cast_precision_loss)]
            let max_window = MAX_MOVING_AVERAGE_WINDOW as f64;
            if window > max_window {
                return Err(Error::FilterError(format!(
                    "Window size must be at most {MAX_MOVING_AVERAGE_WINDOW}, got {window}"
                )));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(Box::new(moving_average::MovingAverageFilter::new(window as usize)))
        }
        ("proximity", &[x, y]) => Ok(Box::new(proximity::ProximityGate::new(
            Point2::new(x, y),
            crate::constants::DEFAULT_PROXIMITY_THRESHOLD,
        ))),
        ("proximity", &[x, y, threshold]) => {
            if threshold <= 0.0 || !threshold.is_finite() {
                return Err(Error::FilterError(format!("Threshold must be positive, got {threshold}")));
            }
            Ok(Box::new(proximity::ProximityGate::new(Point2::new(x, y), threshold)))
        }
        ("kalman", []) => Ok(Box::new(kalman::KalmanFilter2D::default())),
        ("kalman", &[r, q]) => {
            if r < 0.0 || q <= 0.0 {
                return Err(Error::FilterError(format!(
                    "Kalman noise must be non-negative (R) and positive (Q), got R={r} Q={q}"
                )));
            }
            Ok(Box::new(kalman::KalmanFilter2D::new(kalman::KalmanParams::with_noise(r, q))))
        }
        ("none" | "nofilter" | "velocity" | "movingaverage" | "moving_average" | "proximity" | "kalman", _) => Err(
            Error::FilterError(format!("Wrong number of parameters for filter: {filter_type}")),
        ),
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}

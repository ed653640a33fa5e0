//! Configuration management for the gaze calibration pipeline

use crate::{
    constants::{
        DEFAULT_ACCURACY_HISTORY, DEFAULT_ACCURACY_WINDOW_MS, DEFAULT_BASE_OPACITY, DEFAULT_CLICKS_PER_POINT,
        DEFAULT_EDGE_POINTS, DEFAULT_MAX_VELOCITY, DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_OPACITY_STEP,
        DEFAULT_PROXIMITY_THRESHOLD, DEFAULT_RESET_OPACITY, MAX_MOVING_AVERAGE_WINDOW,
    },
    filters::kalman::KalmanParams,
    sample::Viewport,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen the calibration targets are laid out on
    pub viewport: Viewport,

    /// Sample filter chain configuration
    pub filter: FilterConfig,

    /// Calibration session configuration
    pub calibration: CalibrationConfig,

    /// Accuracy measurement configuration
    pub accuracy: AccuracyConfig,
}

/// Filter chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Velocity gate ceiling in units per second
    pub max_velocity: f64,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Proximity gate radius
    pub proximity_threshold: f64,

    /// Proximity gate reference; the viewport centre when unset
    pub proximity_reference: Option<(f64, f64)>,

    /// Per-axis Kalman smoother parameters
    pub kalman: KalmanParams,
}

/// Calibration session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of edge targets clicked before the centre unlocks
    pub edge_points: usize,

    /// Clicks needed to calibrate one point
    pub clicks_per_point: u32,

    /// Opacity of an unclicked point
    pub base_opacity: f64,

    /// Opacity gained per click
    pub opacity_step: f64,

    /// Opacity after a full calibration reset
    pub reset_opacity: f64,
}

/// Accuracy measurement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyConfig {
    /// Length of the measurement window in milliseconds
    pub window_ms: f64,

    /// Distance at which a sample scores zero; half the viewport height when unset
    pub score_radius: Option<f64>,

    /// Most recent samples scored (0 scores the whole window)
    pub history_limit: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_velocity: DEFAULT_MAX_VELOCITY,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            proximity_reference: None,
            kalman: KalmanParams::default(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            edge_points: DEFAULT_EDGE_POINTS,
            clicks_per_point: DEFAULT_CLICKS_PER_POINT,
            base_opacity: DEFAULT_BASE_OPACITY,
            opacity_step: DEFAULT_OPACITY_STEP,
            reset_opacity: DEFAULT_RESET_OPACITY,
        }
    }
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_ACCURACY_WINDOW_MS,
            score_radius: None,
            history_limit: DEFAULT_ACCURACY_HISTORY,
        }
    }
}

impl AccuracyConfig {
    /// Score radius, falling back to half the viewport height
    #[must_use]
    pub fn effective_radius(&self, viewport: &Viewport) -> f64 {
        self.score_radius.unwrap_or(viewport.height / 2.0)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Viewport
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(Error::ConfigError("Viewport dimensions must be positive".to_string()));
        }

        // Filter chain
        if !(self.filter.max_velocity > 0.0) {
            return Err(Error::ConfigError("Max velocity must be positive".to_string()));
        }
        if self.filter.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.filter.moving_average_window > MAX_MOVING_AVERAGE_WINDOW {
            return Err(Error::ConfigError(format!(
                "Moving average window size must be at most {MAX_MOVING_AVERAGE_WINDOW}"
            )));
        }
        if !(self.filter.proximity_threshold > 0.0) {
            return Err(Error::ConfigError("Proximity threshold must be positive".to_string()));
        }
        let kalman = &self.filter.kalman;
        for (name, value) in [("R", kalman.r), ("Q", kalman.q), ("A", kalman.a), ("B", kalman.b), ("C", kalman.c)] {
            if !value.is_finite() {
                return Err(Error::ConfigError(format!("Kalman parameter {name} must be finite, got {value}")));
            }
        }
        if kalman.c == 0.0 {
            return Err(Error::ConfigError("Kalman observation model C must be non-zero".to_string()));
        }
        if kalman.r < 0.0 || kalman.q <= 0.0 {
            return Err(Error::ConfigError(format!(
                "Kalman noise must be non-negative (R) and positive (Q), got R={} Q={}",
                kalman.r, kalman.q
            )));
        }

        // Calibration
        if self.calibration.edge_points == 0 {
            return Err(Error::ConfigError("At least one edge point is required".to_string()));
        }
        if self.calibration.clicks_per_point == 0 {
            return Err(Error::ConfigError("Clicks per point must be greater than 0".to_string()));
        }
        for (name, value) in [
            ("Base opacity", self.calibration.base_opacity),
            ("Opacity step", self.calibration.opacity_step),
            ("Reset opacity", self.calibration.reset_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")));
            }
        }

        // Accuracy
        if !(self.accuracy.window_ms > 0.0) {
            return Err(Error::ConfigError("Accuracy window must be positive".to_string()));
        }
        if !(self.accuracy.effective_radius(&self.viewport) > 0.0) {
            return Err(Error::ConfigError("Accuracy score radius must be positive".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r"# Gaze Calibration Configuration

# Screen the calibration targets are laid out on
viewport:
  width: 1920.0
  height: 1080.0

# Sample filter chain
filter:
  max_velocity: 300.0
  moving_average_window: 3
  proximity_threshold: 50.0
  # proximity_reference: [960.0, 540.0]
  kalman:
    r: 0.5
    q: 0.3
    a: 1.0
    b: 0.0
    c: 1.0

# Calibration session
calibration:
  edge_points: 16
  clicks_per_point: 5
  base_opacity: 0.4
  opacity_step: 0.15
  reset_opacity: 0.2

# Accuracy measurement
accuracy:
  window_ms: 5000.0
  # score_radius: 540.0
  history_limit: 50
";

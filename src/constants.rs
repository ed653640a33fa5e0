//! Constants used throughout the application

/// Velocity ceiling for the velocity gate, in units per second
pub const DEFAULT_MAX_VELOCITY: f64 = 300.0;

/// Number of velocity-accepted positions averaged per tick
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 3;

/// Largest accepted moving average window
pub const MAX_MOVING_AVERAGE_WINDOW: usize = 10_000;

/// Proximity gate radius around the reference point
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 50.0;

/// Default Kalman parameters (near-identity transition, direct observation)
pub const DEFAULT_KALMAN_R: f64 = 0.5;
pub const DEFAULT_KALMAN_Q: f64 = 0.3;
pub const DEFAULT_KALMAN_A: f64 = 1.0;
pub const DEFAULT_KALMAN_B: f64 = 0.0;
pub const DEFAULT_KALMAN_C: f64 = 1.0;

/// Default viewport used when no configuration is given
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1920.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 1080.0;

/// Number of edge calibration targets
pub const DEFAULT_EDGE_POINTS: usize = 16;

/// Clicks required before a point counts as calibrated
pub const DEFAULT_CLICKS_PER_POINT: u32 = 5;

/// Identifier of the centre calibration point
pub const CENTER_POINT_ID: &str = "center";

/// Point opacity before the first click, and the increment per click
pub const DEFAULT_BASE_OPACITY: f64 = 0.4;
pub const DEFAULT_OPACITY_STEP: f64 = 0.15;

/// Opacity restored by a full calibration reset
pub const DEFAULT_RESET_OPACITY: f64 = 0.2;

/// Length of the accuracy measurement window in milliseconds
pub const DEFAULT_ACCURACY_WINDOW_MS: f64 = 5000.0;

/// Most recent buffered samples that are scored (0 scores all of them)
pub const DEFAULT_ACCURACY_HISTORY: usize = 50;

/// Milliseconds per second, for velocity conversion
pub const MS_PER_SECOND: f64 = 1000.0;

//! Gaze calibration library for webcam eye tracking.
//!
//! An external gaze engine produces noisy, high-frequency (x, y) screen
//! estimates. This library turns them into:
//! - a smoothed, outlier-rejected live gaze stream
//! - a validated per-user calibration with an accuracy score
//!
//! The pipeline consists of:
//! 1. A boundary adapter dropping readings without an estimate
//! 2. The sample filter chain: velocity gate, moving average, proximity gate
//!    and per-axis Kalman smoothing
//! 3. The calibration session state machine driving the user through the
//!    calibration targets
//! 4. The accuracy estimator scoring a fixed window of filtered samples
//!    against the centre target
//!
//! # Examples
//!
//! ## Filtering a gaze stream
//!
//! ```
//! use gaze_calibration::{config::Config, filters::chain::FilterChain, sample::GazeSample};
//!
//! let config = Config::default();
//! let mut chain = FilterChain::from_config(&config);
//! let center = config.viewport.center();
//!
//! // Samples near the screen centre pass, everything else is a gap
//! let filtered = chain.process(GazeSample::new(center.x + 10.0, center.y, 0.0));
//! assert!(filtered.is_some());
//! let filtered = chain.process(GazeSample::new(0.0, 0.0, 1000.0));
//! assert!(filtered.is_none());
//! ```
//!
//! ## Driving a calibration session
//!
//! ```
//! use gaze_calibration::{
//!     calibration::{CalibrationSession, ClickOutcome, Phase},
//!     config::Config,
//! };
//!
//! # fn main() -> gaze_calibration::Result<()> {
//! let mut session = CalibrationSession::from_config(&Config::default());
//! session.start();
//!
//! for i in 1..=16 {
//!     for _ in 0..5 {
//!         session.click(&format!("Pt{i}"))?;
//!     }
//! }
//! assert_eq!(session.phase(), Phase::CenterPending);
//!
//! for _ in 0..5 {
//!     session.click("center")?;
//! }
//!
//! // Nothing is measured until the instructions are confirmed
//! let request = session.confirm_instructions().expect("all points calibrated");
//! assert_eq!(session.phase(), Phase::MeasuringAccuracy);
//! assert_eq!(request.duration_ms, 5000.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoring a measurement window
//!
//! ```
//! use gaze_calibration::{accuracy::AccuracyEstimator, sample::GazeSample};
//! use nalgebra::Point2;
//!
//! # fn main() -> gaze_calibration::Result<()> {
//! let target = Point2::new(960.0, 540.0);
//! let mut estimator = AccuracyEstimator::new(540.0, 50);
//! let samples = (0..100).map(|i| GazeSample::new(960.0, 540.0, f64::from(i) * 50.0));
//! let result = estimator.run(5000.0, target, samples)?;
//! println!("Accuracy: {result}");
//! # Ok(())
//! # }
//! ```

/// Gaze sample and viewport types
pub mod sample;

/// Signal filtering stages for smoothing gaze estimates
pub mod filters;

/// Calibration session state machine
pub mod calibration;

/// Accuracy measurement over a fixed window
pub mod accuracy;

/// Summary statistics over gaze samples
pub mod stats;

/// Boundary adapter for the gaze engine stream
pub mod source;

/// Time sources
pub mod clock;

/// Error types and result handling
pub mod error;

/// Controller owning the whole calibration state
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};

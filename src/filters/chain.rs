//! The fixed four-stage gaze sample pipeline.

use super::{
    kalman::KalmanFilter2D, moving_average::MovingAverageFilter, proximity::ProximityGate, velocity::VelocityGate,
    GazeFilter,
};
use crate::{
    config::{Config, FilterConfig},
    sample::{FilteredSample, RawSample, Viewport},
};
use serde::Serialize;

/// Counters of what happened to the samples fed through a chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    /// Samples handed to the chain
    pub received: u64,
    /// Samples dropped by the velocity gate
    pub velocity_rejected: u64,
    /// Samples dropped by the proximity gate
    pub proximity_rejected: u64,
    /// Filtered samples emitted
    pub emitted: u64,
}

/// Velocity gate, moving average, proximity gate and per-axis Kalman smoothing,
/// always applied in that order
pub struct FilterChain {
    velocity: VelocityGate,
    average: MovingAverageFilter,
    proximity: ProximityGate,
    kalman: KalmanFilter2D,
    stats: ChainStats,
}

impl FilterChain {
    /// Build a chain from filter settings; the proximity gate defaults to the
    /// viewport centre
    ///
    /// # Panics
    ///
    /// Panics on parameters that `Config::validate` rejects
    #[must_use]
    pub fn new(settings: &FilterConfig, viewport: Viewport) -> Self {
        let reference = settings
            .proximity_reference
            .map_or_else(|| viewport.center(), |(x, y)| nalgebra::Point2::new(x, y));

        Self {
            velocity: VelocityGate::new(settings.max_velocity),
            average: MovingAverageFilter::new(settings.moving_average_window),
            proximity: ProximityGate::new(reference, settings.proximity_threshold),
            kalman: KalmanFilter2D::new(settings.kalman),
            stats: ChainStats::default(),
        }
    }

    /// Build a chain from the application configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.filter, config.viewport)
    }

    /// Run one raw sample through every stage; `None` means no output this tick
    pub fn process(&mut self, sample: RawSample) -> Option<FilteredSample> {
        self.stats.received += 1;

        let Some(sample) = self.velocity.apply(sample) else {
            self.stats.velocity_rejected += 1;
            return None;
        };

        let averaged = self.average.apply(sample)?;

        let Some(near) = self.proximity.apply(averaged) else {
            self.stats.proximity_rejected += 1;
            return None;
        };

        let filtered = self.kalman.apply(near)?;
        self.stats.emitted += 1;
        Some(filtered)
    }

    /// Counters since construction or the last reset
    #[must_use]
    pub const fn stats(&self) -> ChainStats {
        self.stats
    }

    /// The proximity stage
    #[must_use]
    pub const fn proximity(&self) -> &ProximityGate {
        &self.proximity
    }

    /// The Kalman stage
    #[must_use]
    pub const fn kalman(&self) -> &KalmanFilter2D {
        &self.kalman
    }

    /// Drop all history so the next sample starts a fresh tracking session
    pub fn reset(&mut self) {
        self.velocity.reset();
        self.average.reset();
        self.proximity.reset();
        self.kalman.reset();
        self.stats = ChainStats::default();
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GazeFilter for FilterChain {
    fn apply(&mut self, sample: RawSample) -> Option<FilteredSample> {
        self.process(sample)
    }

    fn reset(&mut self) {
        Self::reset(self);
    }

    fn name(&self) -> &str {
        "FilterChain"
    }
}

//! Accuracy measurement over a fixed window of filtered gaze samples.
//!
//! While armed, the estimator buffers every filtered sample. Once the window
//! has elapsed it scores how close the samples landed to the fixation target:
//! each sample scores `100 * (1 - d / radius)` clamped to `[0, 100]`, where `d`
//! is its distance to the target, and the result is the mean over the most
//! recent `history_limit` samples. An empty window scores 0.

use crate::{config::Config, sample::GazeSample, stats::PointStatistics, Error, Result};
use log::{info, warn};
use nalgebra::Point2;
use serde::Serialize;
use std::fmt;

/// Identifies one measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MeasurementId(u64);

impl MeasurementId {
    /// Raw run number
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Outcome of one accuracy measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyResult {
    /// Precision score in `[0, 100]`
    pub precision_percent: f64,
    /// Number of samples the score was computed from
    pub sample_count: usize,
    /// Centroid and spread of the scored samples
    pub statistics: Option<PointStatistics>,
}

impl fmt::Display for AccuracyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}% ({} samples)", self.precision_percent, self.sample_count)
    }
}

/// Mean per-sample precision against `target`
///
/// Deterministic, bounded to `[0, 100]` and non-increasing in every sample's
/// distance to the target.
#[must_use]
pub fn precision_score(samples: &[GazeSample], target: &Point2<f64>, radius: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let total: f64 = samples
        .iter()
        .map(|s| {
            let score = 100.0 * (1.0 - s.distance_to(target) / radius);
            // NaN scores as a miss
            if score.is_nan() {
                0.0
            } else {
                score.clamp(0.0, 100.0)
            }
        })
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    total / n
}

#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    id: MeasurementId,
    deadline: f64,
    target: Point2<f64>,
}

/// Buffers filtered samples during a measurement window and scores them
pub struct AccuracyEstimator {
    radius: f64,
    history_limit: usize,
    buffer: Vec<GazeSample>,
    active: Option<ActiveRun>,
    next_id: u64,
}

impl AccuracyEstimator {
    /// Create a new estimator
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not positive
    #[must_use]
    pub fn new(radius: f64, history_limit: usize) -> Self {
        assert!(radius > 0.0, "Score radius must be positive, got {radius}");
        Self {
            radius,
            history_limit,
            buffer: Vec::new(),
            active: None,
            next_id: 0,
        }
    }

    /// Create an estimator from the application configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.accuracy.effective_radius(&config.viewport),
            config.accuracy.history_limit,
        )
    }

    /// Start buffering samples for `duration_ms` from `now_ms`
    ///
    /// Arming while a run is active is rejected and leaves that run untouched.
    pub fn arm(&mut self, now_ms: f64, duration_ms: f64, target: Point2<f64>) -> Result<MeasurementId> {
        if let Some(run) = self.active {
            warn!("Rejected accuracy measurement: run {} still active", run.id.0);
            return Err(Error::MeasurementActive);
        }
        if !(duration_ms > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Measurement duration must be positive, got {duration_ms}"
            )));
        }

        self.next_id += 1;
        let id = MeasurementId(self.next_id);
        self.buffer.clear();
        self.active = Some(ActiveRun {
            id,
            deadline: now_ms + duration_ms,
            target,
        });
        info!(
            "Accuracy measurement {} armed for {duration_ms} ms at ({:.1}, {:.1})",
            id.0, target.x, target.y
        );
        Ok(id)
    }

    /// Whether a run is in progress
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    /// Identifier of the run in progress
    #[must_use]
    pub fn active_id(&self) -> Option<MeasurementId> {
        self.active.map(|run| run.id)
    }

    /// Samples buffered by the current run
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer a filtered sample; ignored unless armed
    pub fn record(&mut self, sample: GazeSample) -> bool {
        if self.active.is_some() {
            self.buffer.push(sample);
            true
        } else {
            false
        }
    }

    /// Finish the run if its window has elapsed by `now_ms`
    pub fn poll(&mut self, now_ms: f64) -> Option<(MeasurementId, AccuracyResult)> {
        let run = self.active?;
        if now_ms < run.deadline {
            return None;
        }

        self.active = None;
        let start = match self.history_limit {
            0 => 0,
            limit => self.buffer.len().saturating_sub(limit),
        };
        let scored = &self.buffer[start..];
        let result = AccuracyResult {
            precision_percent: precision_score(scored, &run.target, self.radius),
            sample_count: scored.len(),
            statistics: PointStatistics::from_samples(scored),
        };
        self.buffer.clear();

        info!("Accuracy measurement {} finished: {result}", run.id.0);
        Some((run.id, result))
    }

    /// Abandon the current run without producing a result
    pub fn cancel(&mut self) -> Option<MeasurementId> {
        let run = self.active.take()?;
        self.buffer.clear();
        info!("Accuracy measurement {} abandoned", run.id.0);
        Some(run.id)
    }

    /// Measure a pre-recorded stream in one call
    ///
    /// The window opens at the first sample's timestamp; samples at or past the
    /// deadline are not scored.
    pub fn run<I>(&mut self, duration_ms: f64, target: Point2<f64>, samples: I) -> Result<AccuracyResult>
    where
        I: IntoIterator<Item = GazeSample>,
    {
        let mut samples = samples.into_iter().peekable();
        let start = samples.peek().map_or(0.0, |s| s.timestamp);
        self.run_from(start, duration_ms, target, samples)
    }

    /// Measure a pre-recorded stream whose window opens at `start`
    ///
    /// Samples before `start_ms` are not scored.
    pub fn run_from<I>(
        &mut self,
        start: f64,
        duration_ms: f64,
        target: Point2<f64>,
        samples: I,
    ) -> Result<AccuracyResult>
    where
        I: IntoIterator<Item = GazeSample>,
    {
        let id = self.arm(start, duration_ms, target)?;

        for sample in samples {
            if sample.timestamp < start {
                continue;
            }
            if let Some((_, result)) = self.poll(sample.timestamp) {
                return Ok(result);
            }
            self.record(sample);
        }

        self.poll(start + duration_ms)
            .map(|(_, result)| result)
            .ok_or_else(|| Error::InvalidInput(format!("Measurement {} did not finish", id.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Point2<f64> {
        Point2::new(960.0, 540.0)
    }

    #[test]
    fn test_score_on_target_is_full() {
        let samples = vec![GazeSample::new(960.0, 540.0, 0.0); 10];
        assert_eq!(precision_score(&samples, &target(), 540.0), 100.0);
    }

    #[test]
    fn test_score_is_bounded_and_monotonic() {
        let near = [GazeSample::new(960.0 + 54.0, 540.0, 0.0)];
        let far = [GazeSample::new(960.0 + 270.0, 540.0, 0.0)];
        let off = [GazeSample::new(0.0, 0.0, 0.0)];
        let near_score = precision_score(&near, &target(), 540.0);
        let far_score = precision_score(&far, &target(), 540.0);
        assert!((near_score - 90.0).abs() < 1e-9);
        assert!((far_score - 50.0).abs() < 1e-9);
        assert_eq!(precision_score(&off, &target(), 540.0), 0.0);
    }

    #[test]
    fn test_run_from_fixed_window_start() {
        // The first filtered sample arrives late; the window still closes at 1000
        let samples = [
            GazeSample::new(0.0, 0.0, -50.0),
            GazeSample::new(960.0, 540.0, 800.0),
            GazeSample::new(960.0, 540.0, 900.0),
            GazeSample::new(0.0, 0.0, 1200.0),
        ];
        let mut estimator = AccuracyEstimator::new(540.0, 50);
        let result = estimator.run_from(0.0, 1000.0, target(), samples).unwrap();
        assert_eq!(result.sample_count, 2);
        assert_eq!(result.precision_percent, 100.0);

        // Opening at the first sample would have scored the late miss too
        let result = estimator.run(1000.0, target(), samples.into_iter().skip(1)).unwrap();
        assert_eq!(result.sample_count, 3);
    }

    #[test]
    fn test_non_finite_sample_scores_as_miss() {
        let samples = [GazeSample::new(960.0, 540.0, 0.0), GazeSample::new(f64::NAN, 540.0, 10.0)];
        assert_eq!(precision_score(&samples, &target(), 540.0), 50.0);
    }

    #[test]
    fn test_empty_window_scores_zero() {
        assert_eq!(precision_score(&[], &target(), 540.0), 0.0);

        let mut estimator = AccuracyEstimator::new(540.0, 50);
        estimator.arm(0.0, 5000.0, target()).unwrap();
        let (_, result) = estimator.poll(5000.0).unwrap();
        assert_eq!(result.sample_count, 0);
        assert_eq!(result.precision_percent, 0.0);
        assert!(result.statistics.is_none());
    }

    #[test]
    fn test_second_arm_is_rejected() {
        let mut estimator = AccuracyEstimator::new(540.0, 50);
        let first = estimator.arm(0.0, 5000.0, target()).unwrap();
        estimator.record(GazeSample::new(960.0, 540.0, 10.0));

        assert!(matches!(estimator.arm(100.0, 5000.0, target()), Err(Error::MeasurementActive)));
        assert_eq!(estimator.active_id(), Some(first));
        assert_eq!(estimator.buffered(), 1);
    }

    #[test]
    fn test_poll_before_deadline() {
        let mut estimator = AccuracyEstimator::new(540.0, 50);
        estimator.arm(1000.0, 5000.0, target()).unwrap();
        assert!(estimator.poll(5999.0).is_none());
        assert!(estimator.poll(6000.0).is_some());
        assert!(!estimator.is_armed());
        assert!(estimator.poll(7000.0).is_none());
    }

    #[test]
    fn test_record_ignored_when_idle() {
        let mut estimator = AccuracyEstimator::new(540.0, 50);
        assert!(!estimator.record(GazeSample::new(0.0, 0.0, 0.0)));
        assert_eq!(estimator.buffered(), 0);
    }

    #[test]
    fn test_cancel_discards_buffer() {
        let mut estimator = AccuracyEstimator::new(540.0, 50);
        let id = estimator.arm(0.0, 5000.0, target()).unwrap();
        estimator.record(GazeSample::new(960.0, 540.0, 10.0));
        assert_eq!(estimator.cancel(), Some(id));
        assert!(estimator.poll(10_000.0).is_none());

        let next = estimator.arm(0.0, 5000.0, target()).unwrap();
        assert_ne!(next, id);
        assert_eq!(estimator.buffered(), 0);
    }

    #[test]
    fn test_history_limit_scores_latest_samples() {
        let mut estimator = AccuracyEstimator::new(540.0, 2);
        estimator.arm(0.0, 100.0, target()).unwrap();
        estimator.record(GazeSample::new(0.0, 0.0, 10.0));
        estimator.record(GazeSample::new(960.0, 540.0, 20.0));
        estimator.record(GazeSample::new(960.0, 540.0, 30.0));
        let (_, result) = estimator.poll(100.0).unwrap();
        assert_eq!(result.sample_count, 2);
        assert_eq!(result.precision_percent, 100.0);
    }

    #[test]
    fn test_run_ignores_samples_after_window() {
        let mut estimator = AccuracyEstimator::new(540.0, 0);
        let samples = vec![
            GazeSample::new(960.0, 540.0, 0.0),
            GazeSample::new(960.0, 540.0, 4999.0),
            GazeSample::new(0.0, 0.0, 5000.0),
        ];
        let result = estimator.run(5000.0, target(), samples).unwrap();
        assert_eq!(result.sample_count, 2);
        assert_eq!(result.precision_percent, 100.0);
        assert!(!estimator.is_armed());
    }
}

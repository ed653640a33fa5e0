use super::GazeFilter;
use crate::{
    constants::{DEFAULT_KALMAN_A, DEFAULT_KALMAN_B, DEFAULT_KALMAN_C, DEFAULT_KALMAN_Q, DEFAULT_KALMAN_R},
    sample::GazeSample,
};
use serde::{Deserialize, Serialize};

/// Parameters of a one-dimensional Kalman smoother
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanParams {
    /// Process noise added to the predicted covariance
    pub r: f64,
    /// Measurement noise
    pub q: f64,
    /// State transition
    pub a: f64,
    /// Control input gain
    pub b: f64,
    /// Observation model
    pub c: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            r: DEFAULT_KALMAN_R,
            q: DEFAULT_KALMAN_Q,
            a: DEFAULT_KALMAN_A,
            b: DEFAULT_KALMAN_B,
            c: DEFAULT_KALMAN_C,
        }
    }
}

impl KalmanParams {
    /// Parameters with the given noise terms and identity model
    #[must_use]
    pub fn with_noise(r: f64, q: f64) -> Self {
        Self { r, q, ..Self::default() }
    }
}

/// Scalar Kalman filter for one screen axis
///
/// The estimate and covariance stay unset until the first observation; after
/// that both are always numeric.
#[derive(Debug, Clone)]
pub struct KalmanSmoother {
    params: KalmanParams,
    estimate: Option<f64>,
    covariance: Option<f64>,
}

impl KalmanSmoother {
    /// Create a new smoother
    ///
    /// # Panics
    ///
    /// Panics if the observation model `c` is zero
    #[must_use]
    pub fn new(params: KalmanParams) -> Self {
        assert!(params.c != 0.0, "Observation model C must be non-zero");
        Self {
            params,
            estimate: None,
            covariance: None,
        }
    }

    /// Feed one observation and return the updated estimate
    pub fn filter(&mut self, observation: f64, control: f64) -> f64 {
        let KalmanParams { r, q, a, b, c } = self.params;

        let (estimate, covariance) = match (self.estimate, self.covariance) {
            (Some(estimate), Some(covariance)) => {
                // Predict
                let predicted = a * estimate + b * control;
                let predicted_cov = a * covariance * a + r;

                // Correct
                let gain = predicted_cov * c / (c * predicted_cov * c + q);
                (
                    predicted + gain * (observation - c * predicted),
                    predicted_cov - gain * c * predicted_cov,
                )
            }
            _ => (observation / c, q / (c * c)),
        };

        self.estimate = Some(estimate);
        self.covariance = Some(covariance);
        estimate
    }

    /// Current estimate, `None` before the first observation
    #[must_use]
    pub const fn estimate(&self) -> Option<f64> {
        self.estimate
    }

    /// Current covariance, `None` before the first observation
    #[must_use]
    pub const fn covariance(&self) -> Option<f64> {
        self.covariance
    }

    /// Parameters fixed at construction
    #[must_use]
    pub const fn params(&self) -> &KalmanParams {
        &self.params
    }

    /// Forget the estimate
    pub fn reset(&mut self) {
        self.estimate = None;
        self.covariance = None;
    }
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self::new(KalmanParams::default())
    }
}

/// Independent Kalman smoothers for the x and y axes
#[derive(Debug, Clone)]
pub struct KalmanFilter2D {
    x: KalmanSmoother,
    y: KalmanSmoother,
}

impl KalmanFilter2D {
    /// Create a pair of smoothers sharing the same parameters
    ///
    /// # Panics
    ///
    /// Panics if the observation model `c` is zero
    #[must_use]
    pub fn new(params: KalmanParams) -> Self {
        Self {
            x: KalmanSmoother::new(params),
            y: KalmanSmoother::new(params),
        }
    }

    /// Smoother for the x axis
    #[must_use]
    pub const fn x_axis(&self) -> &KalmanSmoother {
        &self.x
    }

    /// Smoother for the y axis
    #[must_use]
    pub const fn y_axis(&self) -> &KalmanSmoother {
        &self.y
    }
}

impl Default for KalmanFilter2D {
    fn default() -> Self {
        Self::new(KalmanParams::default())
    }
}

impl GazeFilter for KalmanFilter2D {
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample> {
        let x = self.x.filter(sample.x, 0.0);
        let y = self.y.filter(sample.y, 0.0);
        Some(GazeSample::new(x, y, sample.timestamp))
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}

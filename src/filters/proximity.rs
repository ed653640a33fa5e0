use super::GazeFilter;
use crate::sample::GazeSample;
use log::debug;
use nalgebra::Point2;

/// Passes only samples strictly closer than `threshold` to a reference point
pub struct ProximityGate {
    reference: Point2<f64>,
    threshold: f64,
}

impl ProximityGate {
    /// Create a new proximity gate
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not positive
    #[must_use]
    pub fn new(reference: Point2<f64>, threshold: f64) -> Self {
        assert!(threshold > 0.0, "Threshold must be positive, got {threshold}");
        Self { reference, threshold }
    }

    /// Point distances are measured from
    #[must_use]
    pub const fn reference(&self) -> Point2<f64> {
        self.reference
    }

    /// Gate radius
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl GazeFilter for ProximityGate {
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample> {
        let distance = sample.distance_to(&self.reference);
        if distance < self.threshold {
            Some(sample)
        } else {
            debug!("Proximity gate rejected sample at distance {distance:.1}");
            None
        }
    }

    // Stateless
    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "ProximityGate"
    }
}

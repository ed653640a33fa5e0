use super::GazeFilter;
use crate::{constants::MS_PER_SECOND, sample::GazeSample};
use log::debug;

/// Velocity gate rejecting implausibly fast gaze jumps
///
/// Speed is measured against the last evaluated position, which is replaced on
/// every evaluation with a positive time step whether or not the sample passes.
pub struct VelocityGate {
    max_velocity: f64,
    last: Option<GazeSample>,
}

impl VelocityGate {
    /// Create a new velocity gate
    ///
    /// # Panics
    ///
    /// Panics if `max_velocity` is not positive
    #[must_use]
    pub fn new(max_velocity: f64) -> Self {
        assert!(max_velocity > 0.0, "Max velocity must be positive, got {max_velocity}");
        Self {
            max_velocity,
            last: None,
        }
    }

    /// Velocity ceiling in units per second
    #[must_use]
    pub const fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    /// Check a sample against the previous one
    pub fn accepts(&mut self, sample: &GazeSample) -> bool {
        if !(sample.x.is_finite() && sample.y.is_finite() && sample.timestamp.is_finite()) {
            debug!("Velocity gate rejected non-finite sample");
            return false;
        }

        let Some(last) = self.last else {
            self.last = Some(*sample);
            return true;
        };

        let dt = (sample.timestamp - last.timestamp) / MS_PER_SECOND;
        if dt <= 0.0 {
            return true;
        }

        let velocity = nalgebra::distance(&sample.position(), &last.position()) / dt;
        self.last = Some(*sample);

        if velocity < self.max_velocity {
            true
        } else {
            debug!("Velocity gate rejected sample: {velocity:.1} units/s");
            false
        }
    }
}

impl GazeFilter for VelocityGate {
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample> {
        self.accepts(&sample).then_some(sample)
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "VelocityGate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_accepted() {
        let mut gate = VelocityGate::new(300.0);
        assert!(gate.accepts(&GazeSample::new(5000.0, 5000.0, 0.0)));
    }

    #[test]
    fn test_fast_jump_rejected() {
        let mut gate = VelocityGate::new(300.0);
        assert!(gate.accepts(&GazeSample::new(0.0, 0.0, 0.0)));
        // 50 units in 100 ms = 500 units/s
        assert!(!gate.accepts(&GazeSample::new(50.0, 0.0, 100.0)));
    }

    #[test]
    fn test_slow_move_accepted() {
        let mut gate = VelocityGate::new(300.0);
        assert!(gate.accepts(&GazeSample::new(0.0, 0.0, 0.0)));
        // 50 units in 1 s = 50 units/s
        assert!(gate.accepts(&GazeSample::new(30.0, 40.0, 1000.0)));
    }

    #[test]
    fn test_rejected_sample_becomes_reference() {
        let mut gate = VelocityGate::new(300.0);
        gate.accepts(&GazeSample::new(0.0, 0.0, 0.0));
        assert!(!gate.accepts(&GazeSample::new(500.0, 0.0, 100.0)));
        // Measured from the rejected position, this is slow
        assert!(gate.accepts(&GazeSample::new(505.0, 0.0, 200.0)));
    }

    #[test]
    fn test_non_positive_dt_passes() {
        let mut gate = VelocityGate::new(300.0);
        gate.accepts(&GazeSample::new(0.0, 0.0, 100.0));
        assert!(gate.accepts(&GazeSample::new(1000.0, 1000.0, 100.0)));
        assert!(gate.accepts(&GazeSample::new(1000.0, 1000.0, 50.0)));
        // The reference did not move, so a fast jump from it is still caught
        assert!(!gate.accepts(&GazeSample::new(1000.0, 0.0, 200.0)));
    }

    #[test]
    fn test_reset_forgets_reference() {
        let mut gate = VelocityGate::new(300.0);
        gate.accepts(&GazeSample::new(0.0, 0.0, 0.0));
        gate.reset();
        assert!(gate.apply(GazeSample::new(900.0, 900.0, 10.0)).is_some());
    }
}

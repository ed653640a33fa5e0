use super::GazeFilter;
use crate::sample::GazeSample;
use nalgebra::{Point2, Vector2};
use std::collections::VecDeque;

/// Moving average over the most recent gaze positions
pub struct MovingAverageFilter {
    window_size: usize,
    history: VecDeque<Point2<f64>>,
}

impl MovingAverageFilter {
    /// Create a new moving average filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        }
    }

    /// Number of positions currently averaged
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no position has been seen since the last reset
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Push a position and return the mean of the window
    pub fn push(&mut self, position: Point2<f64>) -> Point2<f64> {
        self.history.push_back(position);
        if self.history.len() > self.window_size {
            self.history.pop_front();
        }

        #[allow(clippy::cast_precision_loss)]
        let n = self.history.len() as f64;
        let sum = self
            .history
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / n)
    }
}

impl GazeFilter for MovingAverageFilter {
    fn apply(&mut self, sample: GazeSample) -> Option<GazeSample> {
        let mean = self.push(sample.position());
        Some(sample.with_position(mean))
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

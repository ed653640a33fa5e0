//! Boundary adapter for the external gaze engine.
//!
//! The engine reports `(x, y, timestamp)` with either coordinate possibly null
//! while it has no estimate. Null readings are dropped here; malformed input
//! stops the stream so nothing half-parsed reaches the filter chain.

use crate::{sample::RawSample, Error, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One gaze callback from the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeEvent {
    /// Horizontal estimate, `None` while the engine has no prediction
    pub x: Option<f64>,
    /// Vertical estimate, `None` while the engine has no prediction
    pub y: Option<f64>,
    /// Engine timestamp in milliseconds
    pub timestamp: f64,
}

impl GazeEvent {
    /// Event carrying an estimate
    #[must_use]
    pub const fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            timestamp,
        }
    }

    /// Event without an estimate
    #[must_use]
    pub const fn empty(timestamp: f64) -> Self {
        Self {
            x: None,
            y: None,
            timestamp,
        }
    }

    /// Convert to a raw sample; `None` if a coordinate is missing or not finite
    #[must_use]
    pub fn into_sample(self) -> Option<RawSample> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() && self.timestamp.is_finite() => {
                Some(RawSample::new(x, y, self.timestamp))
            }
            _ => None,
        }
    }

    /// Parse one JSON object
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Reads gaze events as JSON lines
///
/// Yields `Ok(None)` for events without an estimate. The first malformed line
/// yields `Error::SampleParse` and ends the iteration.
pub struct SampleReader<R> {
    reader: R,
    line: usize,
    failed: bool,
    buffer: String,
}

impl<R: BufRead> SampleReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            failed: false,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for SampleReader<R> {
    type Item = Result<Option<RawSample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            }
            self.line += 1;

            let trimmed = self.buffer.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(match serde_json::from_str::<GazeEvent>(trimmed) {
                Ok(event) => Ok(event.into_sample()),
                Err(e) => {
                    self.failed = true;
                    Err(Error::SampleParse {
                        line: self.line,
                        message: e.to_string(),
                    })
                }
            });
        }
    }
}

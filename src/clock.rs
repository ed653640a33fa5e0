//! Clock abstraction for deterministic testing.
//!
//! Production code uses `SystemClock` (real time).
//! Tests use `ManualClock` with manual time advancement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Trait abstracting time sources for testability.
pub trait Clock: Send + Sync {
    /// Monotonic time in milliseconds since an arbitrary origin.
    fn now_ms(&self) -> f64;
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock with manually controlled time. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    // f64 bits
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time.
    pub fn set_ms(&self, ms: f64) {
        self.now.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Advance time by the given number of milliseconds.
    pub fn advance_ms(&self, ms: f64) {
        self.set_ms(self.now_ms() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.now.load(Ordering::SeqCst))
    }
}

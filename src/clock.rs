// src/clock.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Seconds on a monotonic session clock.
pub type Timestamp = f64;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Seconds elapsed since the clock was created.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced by hand, for replay and tests.
#[derive(Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.bits.store(now.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

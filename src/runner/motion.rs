// src/runner/motion.rs - Motion value shared with the render tick
use serde::{Deserialize, Serialize};

/// The scalar motion state handed from the frame tick to the render tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerMotion {
    pub speed_meters_per_second: f64,
    pub cadence_steps_per_second: f64,
    pub cadence_steps_per_minute: f64,
}

impl RunnerMotion {
    pub const ZERO: RunnerMotion = RunnerMotion {
        speed_meters_per_second: 0.0,
        cadence_steps_per_second: 0.0,
        cadence_steps_per_minute: 0.0,
    };

    /// Negative components are clamped to zero.
    pub fn sanitized(self) -> RunnerMotion {
        RunnerMotion {
            speed_meters_per_second: self.speed_meters_per_second.max(0.0),
            cadence_steps_per_second: self.cadence_steps_per_second.max(0.0),
            cadence_steps_per_minute: self.cadence_steps_per_minute.max(0.0),
        }
    }
}

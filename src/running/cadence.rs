// src/running/cadence.rs - Smoothed cadence from step events
use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Intervals shorter than this are treated as detector double-fires.
    pub min_step_interval: f64,
    /// Intervals longer than this restart the cadence baseline.
    pub max_step_interval: f64,
    pub smoothing_alpha: f64,
    pub timeout_to_zero: f64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            min_step_interval: 0.15,
            max_step_interval: 1.5,
            smoothing_alpha: 0.25,
            timeout_to_zero: 1.0,
        }
    }
}

/// Smoothed steps-per-second estimate built from step events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceModel {
    pub config: CadenceConfig,
    cadence_steps_per_second: f64,
    last_step_time: Option<Timestamp>,
}

impl CadenceModel {
    pub fn new(config: CadenceConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn cadence_steps_per_second(&self) -> f64 {
        self.cadence_steps_per_second
    }

    pub fn cadence_steps_per_minute(&self) -> f64 {
        self.cadence_steps_per_second * 60.0
    }

    pub fn last_step_time(&self) -> Option<Timestamp> {
        self.last_step_time
    }

    pub fn reset(&mut self) {
        self.cadence_steps_per_second = 0.0;
        self.last_step_time = None;
    }

    /// Records a step. When `interval_since_previous_step` is `None` the interval is
    /// taken from the last accepted step, if any.
    pub fn ingest_step(&mut self, now: Timestamp, interval_since_previous_step: Option<f64>) {
        let interval = interval_since_previous_step
            .or_else(|| self.last_step_time.map(|last| now - last));

        if let Some(interval) = interval {
            if interval < self.config.min_step_interval {
                trace!(interval, "step rejected as double-fire");
                return;
            }

            if interval > self.config.max_step_interval {
                self.cadence_steps_per_second = 0.0;
                self.last_step_time = Some(now);
                return;
            }

            let instantaneous = 1.0 / interval.max(0.0001);
            if self.cadence_steps_per_second == 0.0 {
                self.cadence_steps_per_second = instantaneous;
            } else {
                let alpha = self.config.smoothing_alpha.clamp(0.0, 1.0);
                self.cadence_steps_per_second =
                    (1.0 - alpha) * self.cadence_steps_per_second + alpha * instantaneous;
            }
        }

        self.last_step_time = Some(now);
    }

    /// Idle decay: drops the rate to zero once no step arrived within the timeout.
    pub fn update(&mut self, now: Timestamp) {
        match self.last_step_time {
            None => self.cadence_steps_per_second = 0.0,
            Some(last) if now - last >= self.config.timeout_to_zero => {
                self.cadence_steps_per_second = 0.0;
            }
            Some(_) => {}
        }
    }
}

// src/runner/blender.rs - Speed to idle/slow/fast clip weights
use serde::{Deserialize, Serialize};

const MIN_DENOMINATOR: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerAnimationBlend {
    pub idle_weight: f64,
    pub slow_run_weight: f64,
    pub fast_run_weight: f64,
    pub playback_rate: f64,
}

impl RunnerAnimationBlend {
    pub const IDLE: RunnerAnimationBlend = RunnerAnimationBlend {
        idle_weight: 1.0,
        slow_run_weight: 0.0,
        fast_run_weight: 0.0,
        playback_rate: 1.0,
    };

    pub fn total_weight(&self) -> f64 {
        self.idle_weight + self.slow_run_weight + self.fast_run_weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlenderConfig {
    pub idle_threshold_meters_per_second: f64,
    pub min_run_speed_meters_per_second: f64,
    pub max_run_speed_meters_per_second: f64,

    pub base_speed_meters_per_second: f64,
    pub min_playback_rate: f64,
    pub max_playback_rate: f64,
}

impl Default for BlenderConfig {
    fn default() -> Self {
        Self {
            idle_threshold_meters_per_second: 0.10,
            min_run_speed_meters_per_second: 1.50,
            max_run_speed_meters_per_second: 4.50,
            base_speed_meters_per_second: 2.00,
            min_playback_rate: 0.30,
            max_playback_rate: 3.00,
        }
    }
}

/// Maps a speed onto idle / slow run / fast run clip weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunnerAnimationBlender {
    pub config: BlenderConfig,
}

impl RunnerAnimationBlender {
    pub fn new(config: BlenderConfig) -> Self {
        Self { config }
    }

    pub fn blend(&self, speed_meters_per_second: f64) -> RunnerAnimationBlend {
        let speed = speed_meters_per_second.max(0.0);

        // Inverted ranges are pushed upward to keep idle <= min_run <= max_run.
        let idle = self.config.idle_threshold_meters_per_second;
        let min_run = self.config.min_run_speed_meters_per_second.max(idle);
        let max_run = self.config.max_run_speed_meters_per_second.max(min_run);

        let (idle_weight, slow_run_weight, fast_run_weight) = if speed < idle {
            (1.0, 0.0, 0.0)
        } else if speed < min_run {
            let t = (speed - idle) / (min_run - idle).max(MIN_DENOMINATOR);
            (1.0 - t, t, 0.0)
        } else {
            let t = ((speed - min_run) / (max_run - min_run).max(MIN_DENOMINATOR)).clamp(0.0, 1.0);
            (0.0, 1.0 - t, t)
        };

        let playback_rate = clamp_rate(
            speed / self.config.base_speed_meters_per_second.max(MIN_DENOMINATOR),
            self.config.min_playback_rate,
            self.config.max_playback_rate,
        );

        RunnerAnimationBlend {
            idle_weight,
            slow_run_weight,
            fast_run_weight,
            playback_rate,
        }
    }
}

/// Like `f64::clamp` but tolerates `min > max` by letting `max` win.
pub(crate) fn clamp_rate(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

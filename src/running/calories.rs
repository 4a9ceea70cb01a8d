// src/running/calories.rs - MET-based calorie estimate
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaloriesConfig {
    pub adjustment_factor: f64,
}

impl Default for CaloriesConfig {
    fn default() -> Self {
        Self {
            adjustment_factor: 0.7,
        }
    }
}

/// MET value for a running speed in km/h.
pub fn met_for_speed_kmh(speed_kmh: f64) -> f64 {
    if speed_kmh < 7.0 {
        4.5
    } else if speed_kmh < 12.0 {
        7.5
    } else {
        9.5
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaloriesEstimator {
    pub config: CaloriesConfig,
    calories_burned: f64,
}

impl CaloriesEstimator {
    pub fn new(config: CaloriesConfig) -> Self {
        Self {
            config,
            calories_burned: 0.0,
        }
    }

    pub fn calories_burned(&self) -> f64 {
        self.calories_burned
    }

    pub fn reset(&mut self) {
        self.calories_burned = 0.0;
    }

    pub fn ingest(&mut self, speed_meters_per_second: f64, user_weight_kg: f64, delta_time: f64) {
        if speed_meters_per_second <= 0.0 {
            return;
        }

        let met = met_for_speed_kmh(speed_meters_per_second * 3.6);
        let hours = delta_time.max(0.0) / 3600.0;
        self.calories_burned += met * user_weight_kg.max(0.0) * hours * self.config.adjustment_factor;
    }
}

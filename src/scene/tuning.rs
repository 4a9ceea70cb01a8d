// src/scene/tuning.rs - Runner, camera and terrain tuning
use crate::runner::BlenderConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub scale: f64,
    pub yaw_radians: f64,
    /// Distance the runner is kept ahead of the travel origin.
    pub ahead_offset_z: f64,
    pub additional_ground_offset_y: f64,
    pub x: f64,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            scale: 0.01,
            yaw_radians: 0.0,
            ahead_offset_z: 6.0,
            additional_ground_offset_y: 0.0,
            x: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub field_of_view_degrees: f64,
    pub height_y: f64,
    pub back_offset_z: f64,
    pub look_at_height_y: f64,

    pub bob_max_amplitude: f64,
    pub bob_speed_to_amplitude_gain: f64,
    pub bob_frequency: f64,

    pub sway_max_amplitude: f64,
    pub sway_speed_to_amplitude_gain: f64,
    pub sway_frequency: f64,
    pub base_x: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            field_of_view_degrees: 70.0,
            height_y: 2.2,
            back_offset_z: 5.0,
            look_at_height_y: 1.4,
            bob_max_amplitude: 0.12,
            bob_speed_to_amplitude_gain: 0.02,
            bob_frequency: 6.0,
            sway_max_amplitude: 0.08,
            sway_speed_to_amplitude_gain: 0.015,
            sway_frequency: 3.5,
            base_x: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceTuning {
    pub stride_length_meters_per_step: f64,
    /// Steps covered by one loop of a run clip.
    pub steps_per_loop: f64,
    pub smoothing_alpha: f64,
}

impl Default for CadenceTuning {
    fn default() -> Self {
        Self {
            stride_length_meters_per_step: 1.0,
            steps_per_loop: 2.0,
            smoothing_alpha: 0.3,
        }
    }
}

/// Render-side tuning. Swapped in whole at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTuning {
    pub runner: RunnerTuning,
    pub camera: CameraTuning,
    pub cadence: CadenceTuning,
    pub blender: BlenderConfig,
    pub speed_smoothing_alpha: f64,
}

impl Default for SceneTuning {
    fn default() -> Self {
        Self {
            runner: RunnerTuning::default(),
            camera: CameraTuning::default(),
            cadence: CadenceTuning::default(),
            blender: BlenderConfig::default(),
            speed_smoothing_alpha: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub segment_length: f64,
    pub segment_width: f64,
    pub active_segments: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            segment_length: 10.0,
            segment_width: 8.0,
            active_segments: 12,
        }
    }
}

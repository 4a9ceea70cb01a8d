// src/running/step_detector.rs - Step counting from arm swing
use crate::clock::Timestamp;
use crate::pose::{Joint, Pose};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArmPhase {
    #[default]
    Neutral,
    LeftUp,
    RightUp,
}

impl ArmPhase {
    /// Phase from the vertical offset between the wrists.
    pub fn from_pose(pose: Option<&Pose>, threshold: f64) -> ArmPhase {
        let Some(pose) = pose else {
            return ArmPhase::Neutral;
        };
        let (Some(left), Some(right)) = (pose.joint(Joint::LeftWrist), pose.joint(Joint::RightWrist)) else {
            return ArmPhase::Neutral;
        };

        let delta = left.location.y - right.location.y;
        if delta > threshold {
            ArmPhase::LeftUp
        } else if delta < -threshold {
            ArmPhase::RightUp
        } else {
            ArmPhase::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDetectorConfig {
    pub arm_phase_threshold: f64,
    pub min_step_interval: f64,
    pub min_quality_to_count_step: f64,
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            arm_phase_threshold: 0.06,
            min_step_interval: 0.25,
            min_quality_to_count_step: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub at: Timestamp,
    pub interval_since_previous: Option<f64>,
    pub phase: ArmPhase,
}

/// Counts steps from left/right arm swing alternation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStepDetector {
    pub config: StepDetectorConfig,
    step_count: u64,
    last_step_time: Option<Timestamp>,
    last_phase: ArmPhase,
}

impl RunningStepDetector {
    pub fn new(config: StepDetectorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_phase(&self) -> ArmPhase {
        self.last_phase
    }

    pub fn reset(&mut self) {
        self.step_count = 0;
        self.last_step_time = None;
        self.last_phase = ArmPhase::Neutral;
    }

    /// Returns the step counted by this frame, if any.
    pub fn ingest(
        &mut self,
        pose: Option<&Pose>,
        movement_quality: f64,
        now: Timestamp,
    ) -> Option<StepEvent> {
        // Low quality erases phase memory.
        if movement_quality < self.config.min_quality_to_count_step {
            self.last_phase = ArmPhase::Neutral;
            return None;
        }

        let phase = ArmPhase::from_pose(pose, self.config.arm_phase_threshold);
        if phase == ArmPhase::Neutral {
            self.last_phase = ArmPhase::Neutral;
            return None;
        }

        if phase == self.last_phase {
            return None;
        }

        let interval_since_previous = self.last_step_time.map(|last| now - last);
        if let Some(interval) = interval_since_previous {
            if interval < self.config.min_step_interval {
                return None;
            }
        }

        self.step_count += 1;
        self.last_step_time = Some(now);
        self.last_phase = phase;
        debug!(steps = self.step_count, ?phase, "step detected");

        Some(StepEvent {
            at: now,
            interval_since_previous,
            phase,
        })
    }
}

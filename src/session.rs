// src/session.rs - Frame-tick owner: stabilize, measure, publish
use crate::clock::Timestamp;
use crate::config::{AppConfig, RunnerSettings};
use crate::pose::Pose;
use crate::runner::RunnerMotion;
use crate::running::{CaloriesEstimator, RunningMetrics, RunningMetricsSnapshot};
use crate::shared::MotionCell;
use crate::stabilizer::PoseStabilizer;
use tracing::{debug, info};
use uuid::Uuid;

/// What one processed frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFrame {
    pub snapshot: RunningMetricsSnapshot,
    /// Pose after stabilization, or the raw pose when stabilization is off.
    pub pose: Option<Pose>,
    /// Pose to draw over the camera preview, if the overlay is enabled.
    pub overlay: Option<Pose>,
    pub calories: f64,
}

pub struct RunnerSession {
    id: Uuid,
    settings: RunnerSettings,
    stabilizer: PoseStabilizer,
    metrics: RunningMetrics,
    calories: CaloriesEstimator,
    motion: MotionCell,
    latest: RunningMetricsSnapshot,
    frames: u64,
}

impl RunnerSession {
    pub fn new(config: &AppConfig, motion: MotionCell) -> Self {
        let mut metrics = RunningMetrics::new(config.metrics);
        metrics.step_detector.config = config.step_detector;

        let mut session = Self {
            id: Uuid::new_v4(),
            settings: RunnerSettings::default(),
            stabilizer: PoseStabilizer::new(config.stabilizer),
            metrics,
            calories: CaloriesEstimator::new(config.calories),
            motion,
            latest: RunningMetricsSnapshot::IDLE,
            frames: 0,
        };
        session.apply_settings(config.settings.clone());
        info!(session = %session.id, "runner session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn latest(&self) -> RunningMetricsSnapshot {
        self.latest
    }

    pub fn calories_burned(&self) -> f64 {
        self.calories.calories_burned()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn motion_cell(&self) -> &MotionCell {
        &self.motion
    }

    pub fn apply_settings(&mut self, mut settings: RunnerSettings) {
        settings.user_weight_kg = sanitize_weight(settings.user_weight_kg);
        if settings.pose_stabilization_enabled != self.settings.pose_stabilization_enabled {
            // Held joints from the previous mode would leak into the new one.
            self.stabilizer.reset();
        }
        self.settings = settings;
    }

    pub fn update_user_weight_kg(&mut self, weight_kg: f64) {
        self.settings.user_weight_kg = sanitize_weight(weight_kg);
    }

    pub fn set_pose_stabilization_enabled(&mut self, enabled: bool) {
        let mut settings = self.settings.clone();
        settings.pose_stabilization_enabled = enabled;
        self.apply_settings(settings);
    }

    pub fn handle_pose(&mut self, pose: Option<Pose>, now: Timestamp) -> SessionFrame {
        let pose = if self.settings.pose_stabilization_enabled {
            self.stabilizer.ingest(pose.as_ref(), now)
        } else {
            pose
        };

        let snapshot = self.metrics.ingest(pose.as_ref(), now);
        if let Some(dt) = self.metrics.last_frame_interval() {
            self.calories
                .ingest(snapshot.speed_meters_per_second, self.settings.user_weight_kg, dt);
        }

        self.motion.store(snapshot.motion());
        self.latest = snapshot;
        self.frames += 1;

        let overlay = self.overlay_pose(pose.as_ref());
        SessionFrame {
            snapshot,
            pose,
            overlay,
            calories: self.calories.calories_burned(),
        }
    }

    fn overlay_pose(&self, pose: Option<&Pose>) -> Option<Pose> {
        if !self.settings.show_pose_overlay {
            return None;
        }
        let pose = pose?;
        Some(if self.settings.mirror_pose_overlay {
            pose.mirrored()
        } else {
            pose.clone()
        })
    }

    /// Clears all estimator state and parks the runner.
    pub fn stop(&mut self) {
        self.stabilizer.reset();
        self.metrics.reset();
        self.calories.reset();
        self.latest = RunningMetricsSnapshot::IDLE;
        self.motion.store(RunnerMotion::ZERO);
        info!(session = %self.id, frames = self.frames, "runner session stopped");
        self.frames = 0;
    }

    /// Stops and continues under a fresh id.
    pub fn restart(&mut self) {
        self.stop();
        self.id = Uuid::new_v4();
        debug!(session = %self.id, "runner session restarted");
    }
}

fn sanitize_weight(weight_kg: f64) -> f64 {
    if weight_kg.is_finite() {
        weight_kg.max(0.0)
    } else {
        0.0
    }
}

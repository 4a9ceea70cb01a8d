// src/running/metrics.rs - Per-frame running metrics aggregation
use super::cadence::{CadenceConfig, CadenceModel};
use super::step_detector::RunningStepDetector;
use crate::clock::Timestamp;
use crate::pose::{Joint, Pose};
use crate::runner::RunnerMotion;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_FRAME_INTERVAL: f64 = 1.0 / 20.0;
const MIN_FRAME_INTERVAL: f64 = 0.001;
const NO_KNEES_THRESHOLD_MULTIPLIER: f64 = 0.7;
const QUALITY_EXPONENT: f64 = 1.5;

const QUALITY_JOINTS: [Joint; 4] = [
    Joint::LeftWrist,
    Joint::RightWrist,
    Joint::LeftKnee,
    Joint::RightKnee,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Average joint speed (normalized units/s) that counts as full-quality motion.
    pub movement_threshold: f64,
    pub smoothing_alpha: f64,
    pub stride_length_meters_per_step: f64,
    pub cadence: CadenceConfig,

    pub close_up_shoulder_distance_threshold: f64,
    pub close_up_upper_body_confidence_threshold: f64,
    pub close_up_movement_threshold_multiplier: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 1.0,
            smoothing_alpha: 0.2,
            stride_length_meters_per_step: 1.0,
            cadence: CadenceConfig::default(),
            close_up_shoulder_distance_threshold: 0.24,
            close_up_upper_body_confidence_threshold: 0.5,
            close_up_movement_threshold_multiplier: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningMetricsSnapshot {
    pub pose_detected: bool,
    pub movement_quality_percent: u8,
    pub cadence_steps_per_second: f64,
    pub cadence_steps_per_minute: f64,
    pub speed_meters_per_second: f64,
    pub speed_kilometers_per_hour: f64,
    pub steps: u64,
    pub is_close_up_mode: bool,
    pub shoulder_distance: Option<f64>,
}

impl RunningMetricsSnapshot {
    pub const IDLE: RunningMetricsSnapshot = RunningMetricsSnapshot {
        pose_detected: false,
        movement_quality_percent: 0,
        cadence_steps_per_second: 0.0,
        cadence_steps_per_minute: 0.0,
        speed_meters_per_second: 0.0,
        speed_kilometers_per_hour: 0.0,
        steps: 0,
        is_close_up_mode: false,
        shoulder_distance: None,
    };

    pub fn motion(&self) -> RunnerMotion {
        RunnerMotion {
            speed_meters_per_second: self.speed_meters_per_second,
            cadence_steps_per_second: self.cadence_steps_per_second,
            cadence_steps_per_minute: self.cadence_steps_per_minute,
        }
    }
}

impl Default for RunningMetricsSnapshot {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Runs step detection, cadence and movement quality once per processed frame.
#[derive(Debug, Clone, Default)]
pub struct RunningMetrics {
    pub config: MetricsConfig,
    pub step_detector: RunningStepDetector,
    cadence_model: CadenceModel,
    last_update_time: Option<Timestamp>,
    last_dt: Option<f64>,
    quality: f64,
    previous_positions: HashMap<Joint, Point2<f64>>,
    is_close_up_mode: bool,
    shoulder_distance: Option<f64>,
}

impl RunningMetrics {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            cadence_model: CadenceModel::new(config.cadence),
            ..Default::default()
        }
    }

    pub fn cadence_model(&self) -> &CadenceModel {
        &self.cadence_model
    }

    pub fn movement_quality(&self) -> f64 {
        self.quality
    }

    pub fn is_close_up_mode(&self) -> bool {
        self.is_close_up_mode
    }

    pub fn shoulder_distance(&self) -> Option<f64> {
        self.shoulder_distance
    }

    /// Interval used for the most recent frame.
    pub fn last_frame_interval(&self) -> Option<f64> {
        self.last_dt
    }

    pub fn reset(&mut self) {
        self.cadence_model = CadenceModel::new(self.config.cadence);
        self.step_detector.reset();
        self.last_update_time = None;
        self.last_dt = None;
        self.quality = 0.0;
        self.previous_positions.clear();
        self.is_close_up_mode = false;
        self.shoulder_distance = None;
    }

    pub fn ingest(&mut self, pose: Option<&Pose>, now: Timestamp) -> RunningMetricsSnapshot {
        let dt = match self.last_update_time {
            Some(last) => (now - last).max(MIN_FRAME_INTERVAL),
            None => DEFAULT_FRAME_INTERVAL,
        };
        self.last_update_time = Some(now);
        self.last_dt = Some(dt);

        self.update_close_up_mode(pose);

        let raw_quality = self.raw_movement_quality(pose, dt);
        let alpha = self.config.smoothing_alpha;
        self.quality = (1.0 - alpha) * self.quality + alpha * raw_quality;

        self.cadence_model.config = self.config.cadence;
        // Cadence keeps its own baseline: a step it rejects must not move it.
        if let Some(step) = self.step_detector.ingest(pose, self.quality, now) {
            self.cadence_model.ingest_step(step.at, None);
        }
        self.cadence_model.update(now);

        let cadence = self.cadence_model.cadence_steps_per_second();
        let speed = cadence * self.config.stride_length_meters_per_step.max(0.0);

        RunningMetricsSnapshot {
            pose_detected: pose.is_some(),
            movement_quality_percent: (self.quality * 100.0).round().clamp(0.0, 100.0) as u8,
            cadence_steps_per_second: cadence,
            cadence_steps_per_minute: self.cadence_model.cadence_steps_per_minute(),
            speed_meters_per_second: speed,
            speed_kilometers_per_hour: speed * 3.6,
            steps: self.step_detector.step_count(),
            is_close_up_mode: self.is_close_up_mode,
            shoulder_distance: self.shoulder_distance,
        }
    }

    fn update_close_up_mode(&mut self, pose: Option<&Pose>) {
        let shoulders = pose.and_then(|pose| {
            Some((pose.joint(Joint::LeftShoulder)?, pose.joint(Joint::RightShoulder)?))
        });

        let Some((left, right)) = shoulders else {
            self.is_close_up_mode = false;
            self.shoulder_distance = None;
            return;
        };

        let distance = nalgebra::distance(&left.location, &right.location);
        let upper_body_confidence = (left.confidence + right.confidence) / 2.0;

        self.shoulder_distance = Some(distance);
        self.is_close_up_mode = distance >= self.config.close_up_shoulder_distance_threshold
            && upper_body_confidence >= self.config.close_up_upper_body_confidence_threshold;
    }

    fn raw_movement_quality(&mut self, pose: Option<&Pose>, dt: f64) -> f64 {
        let Some(pose) = pose else {
            self.previous_positions.clear();
            return 0.0;
        };

        let dt = dt.max(MIN_FRAME_INTERVAL);
        let mut total_velocity = 0.0;
        let mut samples = 0usize;

        for joint in QUALITY_JOINTS {
            let Some(observation) = pose.joint(joint) else {
                continue;
            };
            let current = observation.location;

            if let Some(previous) = self.previous_positions.insert(joint, current) {
                let delta = (current - previous) / dt;
                total_velocity += delta.x.abs() + delta.y.abs();
                samples += 1;
            }
        }

        if samples == 0 {
            return 0.0;
        }

        let mut threshold = self.config.movement_threshold;
        if self.is_close_up_mode {
            threshold *= self.config.close_up_movement_threshold_multiplier;
        } else if pose.joint(Joint::LeftKnee).is_none() && pose.joint(Joint::RightKnee).is_none() {
            threshold *= NO_KNEES_THRESHOLD_MULTIPLIER;
        }

        let average = total_velocity / samples as f64;
        let normalized = (average / threshold.max(0.0001)).clamp(0.0, 1.0);
        normalized.powf(QUALITY_EXPONENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::JointObservation;

    fn arms(left_y: f64, right_y: f64) -> Pose {
        Pose::default()
            .with(Joint::LeftWrist, JointObservation::new(0.4, left_y, 1.0))
            .with(Joint::RightWrist, JointObservation::new(0.6, right_y, 1.0))
    }

    #[test]
    fn test_first_frame_has_no_motion() {
        let mut metrics = RunningMetrics::default();
        let snapshot = metrics.ingest(Some(&arms(0.4, 0.4)), 0.0);
        assert!(snapshot.pose_detected);
        assert_eq!(snapshot.movement_quality_percent, 0);
        assert_eq!(snapshot.steps, 0);
        assert_eq!(metrics.last_frame_interval(), Some(DEFAULT_FRAME_INTERVAL));
    }

    #[test]
    fn test_steps_increase_when_arm_phase_alternates() {
        let mut metrics = RunningMetrics::default();
        metrics.step_detector.config.min_step_interval = 0.01;
        metrics.step_detector.config.min_quality_to_count_step = 0.0;

        metrics.ingest(Some(&arms(0.6, 0.4)), 0.0);
        metrics.ingest(Some(&arms(0.4, 0.6)), 0.05);
        let snapshot = metrics.ingest(Some(&arms(0.6, 0.4)), 0.10);
        assert!(snapshot.steps >= 2);
    }

    #[test]
    fn test_vigorous_arm_swing_produces_speed() {
        let mut metrics = RunningMetrics::default();
        let mut snapshot = metrics.ingest(Some(&arms(0.4, 0.4)), 0.0);

        // Swap the raised arm every 0.3 s, sampling at 20 Hz.
        for i in 1..=60 {
            let now = i as f64 * 0.05;
            let left_up = (i / 6) % 2 == 0;
            let dy = if left_up { 0.1 } else { -0.1 };
            snapshot = metrics.ingest(Some(&arms(0.4 + dy, 0.4 - dy)), now);
        }

        assert!(snapshot.movement_quality_percent > 20);
        assert!(snapshot.steps > 5);
        assert!(snapshot.cadence_steps_per_second > 0.0);
        assert!(
            (snapshot.speed_meters_per_second
                - snapshot.cadence_steps_per_second * metrics.config.stride_length_meters_per_step)
                .abs()
                < 1e-12
        );
        assert!((snapshot.speed_kilometers_per_hour - snapshot.speed_meters_per_second * 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_speed_decays_to_zero_without_pose() {
        let mut metrics = RunningMetrics::default();
        metrics.step_detector.config.min_quality_to_count_step = 0.0;
        metrics.ingest(Some(&arms(0.6, 0.4)), 0.0);
        let moving = metrics.ingest(Some(&arms(0.4, 0.6)), 0.5);
        assert!(moving.speed_meters_per_second > 0.0);

        let mut snapshot = moving;
        for i in 1..=40 {
            snapshot = metrics.ingest(None, 0.5 + i as f64 * 0.05);
        }
        assert!(!snapshot.pose_detected);
        assert_eq!(snapshot.speed_meters_per_second, 0.0);
        assert_eq!(snapshot.steps, 2);
    }

    #[test]
    fn test_close_up_mode_uses_shoulder_distance() {
        let mut metrics = RunningMetrics::new(MetricsConfig {
            close_up_shoulder_distance_threshold: 0.2,
            close_up_upper_body_confidence_threshold: 0.0,
            ..Default::default()
        });

        let pose = arms(0.3, 0.3)
            .with(Joint::LeftShoulder, JointObservation::new(0.2, 0.5, 1.0))
            .with(Joint::RightShoulder, JointObservation::new(0.5, 0.5, 1.0));
        let snapshot = metrics.ingest(Some(&pose), 0.0);
        assert!(snapshot.is_close_up_mode);
        assert!((snapshot.shoulder_distance.unwrap_or_default() - 0.3).abs() < 1e-9);

        let far = metrics.ingest(Some(&arms(0.3, 0.3)), 0.05);
        assert!(!far.is_close_up_mode);
        assert_eq!(far.shoulder_distance, None);
    }

    #[test]
    fn test_low_shoulder_confidence_is_not_close_up() {
        let mut metrics = RunningMetrics::default();
        let pose = Pose::default()
            .with(Joint::LeftShoulder, JointObservation::new(0.2, 0.5, 0.3))
            .with(Joint::RightShoulder, JointObservation::new(0.6, 0.5, 0.4));
        let snapshot = metrics.ingest(Some(&pose), 0.0);
        assert!(!snapshot.is_close_up_mode);
        assert!(snapshot.shoulder_distance.is_some());
    }

    #[test]
    fn test_raw_quality_shape() {
        let mut metrics = RunningMetrics::default();
        let knees = |y: f64| {
            Pose::default()
                .with(Joint::LeftKnee, JointObservation::new(0.4, y, 1.0))
                .with(Joint::RightKnee, JointObservation::new(0.6, y, 1.0))
        };
        metrics.raw_movement_quality(Some(&knees(0.5)), 0.05);
        // Each knee moves 0.0125 in 0.05 s -> 0.25 units/s, threshold 1.0.
        let raw = metrics.raw_movement_quality(Some(&knees(0.5125)), 0.05);
        assert!((raw - 0.25f64.powf(1.5)).abs() < 1e-9);

        // Saturates at 1.
        let raw = metrics.raw_movement_quality(Some(&knees(0.9)), 0.05);
        assert!((raw - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_knees_lowers_threshold() {
        let mut metrics = RunningMetrics::default();
        metrics.raw_movement_quality(Some(&arms(0.5, 0.5)), 0.05);
        // 0.01 per wrist per 0.05 s -> 0.2 units/s, threshold 0.7.
        let raw = metrics.raw_movement_quality(Some(&arms(0.51, 0.51)), 0.05);
        assert!((raw - (0.2f64 / 0.7).powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_close_up_multiplier_wins_over_missing_knees() {
        let mut metrics = RunningMetrics::default();
        let pose = |y: f64| {
            arms(y, y)
                .with(Joint::LeftShoulder, JointObservation::new(0.2, 0.7, 1.0))
                .with(Joint::RightShoulder, JointObservation::new(0.5, 0.7, 1.0))
        };

        metrics.update_close_up_mode(Some(&pose(0.5)));
        assert!(metrics.is_close_up_mode());
        metrics.raw_movement_quality(Some(&pose(0.5)), 0.05);

        // 0.2 units/s with no knees: close-up alone gives 1.0 * 0.7, not 0.7 * 0.7.
        let raw = metrics.raw_movement_quality(Some(&pose(0.51)), 0.05);
        assert!((raw - (0.2f64 / 0.7).powf(1.5)).abs() < 1e-9);
        assert!((raw - (0.2f64 / 0.49).powf(1.5)).abs() > 1e-3);
    }

    #[test]
    fn test_repeated_timestamp_uses_minimum_interval() {
        let mut metrics = RunningMetrics::default();
        metrics.ingest(Some(&arms(0.5, 0.5)), 1.0);
        let snapshot = metrics.ingest(Some(&arms(0.5001, 0.5001)), 1.0);

        assert_eq!(metrics.last_frame_interval(), Some(MIN_FRAME_INTERVAL));
        // 0.0001 per wrist over 0.001 s -> 0.1 units/s, no-knees threshold 0.7.
        let expected = metrics.config.smoothing_alpha * (0.1f64 / 0.7).powf(1.5);
        assert!((metrics.movement_quality() - expected).abs() < 1e-6);
        assert!(snapshot.movement_quality_percent <= 100);
    }

    #[test]
    fn test_cadence_measures_from_its_own_last_step() {
        let mut metrics = RunningMetrics::default();
        metrics.step_detector.config.min_step_interval = 0.05;
        metrics.step_detector.config.min_quality_to_count_step = 0.0;

        // Arms swap every 0.1 s: the detector counts each swap, while cadence
        // drops every other one and sees 0.2 s intervals.
        let mut snapshot = RunningMetricsSnapshot::IDLE;
        for i in 0..=10 {
            let (left, right) = if i % 2 == 0 { (0.6, 0.4) } else { (0.4, 0.6) };
            snapshot = metrics.ingest(Some(&arms(left, right)), i as f64 * 0.1);
        }

        assert_eq!(snapshot.steps, 11);
        assert!(
            (snapshot.cadence_steps_per_second - 5.0).abs() < 1e-6,
            "cadence = {}",
            snapshot.cadence_steps_per_second
        );
    }

    #[test]
    fn test_reset_matches_fresh_instance() {
        let mut metrics = RunningMetrics::default();
        metrics.step_detector.config.min_quality_to_count_step = 0.0;
        metrics.ingest(Some(&arms(0.6, 0.4)), 0.0);
        metrics.ingest(Some(&arms(0.4, 0.6)), 0.5);
        metrics.reset();

        let mut fresh = RunningMetrics::default();
        fresh.step_detector.config.min_quality_to_count_step = 0.0;
        let a = metrics.ingest(Some(&arms(0.6, 0.4)), 10.0);
        let b = fresh.ingest(Some(&arms(0.6, 0.4)), 10.0);
        assert_eq!(a, b);
    }
}

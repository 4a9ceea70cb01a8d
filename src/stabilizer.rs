// src/stabilizer.rs - Per-joint hysteresis, smoothing and hold-over
use crate::clock::Timestamp;
use crate::pose::{Joint, JointObservation, Pose};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Extra alpha used while a joint is still hidden, so it pops in closer to where it is.
const HIDDEN_ALPHA_BOOST: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub on_confidence_threshold: f64,
    pub off_confidence_threshold: f64,
    /// Seconds a joint stays emitted after its last confident detection.
    pub hold_duration: f64,
    /// 0 = no smoothing, 1 = no inertia.
    pub smoothing_alpha: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            on_confidence_threshold: 0.35,
            off_confidence_threshold: 0.20,
            hold_duration: 0.20,
            smoothing_alpha: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct JointState {
    is_visible: bool,
    last_seen_at: Option<Timestamp>,
    filtered_location: Option<Point2<f64>>,
}

impl JointState {
    fn held_location(&self, now: Timestamp, hold_duration: f64) -> Option<Point2<f64>> {
        if !self.is_visible {
            return None;
        }
        let last_seen_at = self.last_seen_at?;
        if now - last_seen_at > hold_duration {
            return None;
        }
        self.filtered_location
    }
}

/// Turns a flickering joint stream into a visually stable one.
#[derive(Debug, Clone)]
pub struct PoseStabilizer {
    pub config: StabilizerConfig,
    joint_states: HashMap<Joint, JointState>,
}

impl PoseStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            joint_states: Joint::ALL
                .iter()
                .map(|joint| (*joint, JointState::default()))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        for state in self.joint_states.values_mut() {
            *state = JointState::default();
        }
    }

    pub fn ingest(&mut self, pose: Option<&Pose>, now: Timestamp) -> Option<Pose> {
        let Some(pose) = pose else {
            // No detection at all: replay held joints without touching state.
            return self.hold_only(now);
        };

        let config = self.config;
        let mut output = Pose::default();

        for joint in Joint::ALL {
            let measurement = pose.joint(joint);
            let state = self.joint_states.entry(joint).or_default();

            let confidence = measurement.map_or(0.0, |m| m.confidence);
            let should_turn_on = confidence >= config.on_confidence_threshold;
            let should_turn_off = confidence > 0.0 && confidence < config.off_confidence_threshold;

            if state.is_visible {
                if should_turn_off {
                    if let Some(last_seen_at) = state.last_seen_at {
                        if now - last_seen_at > config.hold_duration {
                            state.is_visible = false;
                            state.filtered_location = None;
                        }
                    }
                }
            } else if should_turn_on {
                state.is_visible = true;
            }

            if let Some(measurement) = measurement.filter(|_| confidence > 0.0) {
                state.last_seen_at = Some(now);

                let alpha = if state.is_visible {
                    config.smoothing_alpha
                } else {
                    (config.smoothing_alpha + HIDDEN_ALPHA_BOOST).min(1.0)
                };
                let previous = state.filtered_location.unwrap_or(measurement.location);
                state.filtered_location = Some(exponential_filter(previous, measurement.location, alpha));
            }

            if let Some(location) = state.held_location(now, config.hold_duration) {
                output = output.with(
                    joint,
                    JointObservation {
                        location,
                        confidence: 1.0,
                    },
                );
            }
        }

        (!output.is_empty()).then_some(output)
    }

    fn hold_only(&self, now: Timestamp) -> Option<Pose> {
        let output: Pose = self
            .joint_states
            .iter()
            .filter_map(|(joint, state)| {
                state
                    .held_location(now, self.config.hold_duration)
                    .map(|location| (*joint, JointObservation { location, confidence: 1.0 }))
            })
            .collect();

        (!output.is_empty()).then_some(output)
    }
}

impl Default for PoseStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

fn exponential_filter(previous: Point2<f64>, current: Point2<f64>, alpha: f64) -> Point2<f64> {
    let a = alpha.clamp(0.0, 1.0);
    Point2::from(previous.coords * (1.0 - a) + current.coords * a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(joint: Joint, x: f64, y: f64, confidence: f64) -> Pose {
        Pose::default().with(joint, JointObservation::new(x, y, confidence))
    }

    #[test]
    fn test_hysteresis_prevents_flicker_near_threshold() {
        let mut stabilizer = PoseStabilizer::new(StabilizerConfig {
            hold_duration: 1.0,
            smoothing_alpha: 1.0,
            ..Default::default()
        });

        let on = single(Joint::LeftWrist, 0.5, 0.5, 0.36);
        let out = stabilizer.ingest(Some(&on), 0.0);
        assert!(out.and_then(|p| p.joint(Joint::LeftWrist).copied()).is_some());

        // Between off and on thresholds: stays visible.
        let mid = single(Joint::LeftWrist, 0.5, 0.5, 0.25);
        let out = stabilizer.ingest(Some(&mid), 0.05);
        assert!(out.and_then(|p| p.joint(Joint::LeftWrist).copied()).is_some());
    }

    #[test]
    fn test_dead_zone_does_not_turn_joint_on() {
        let mut stabilizer = PoseStabilizer::default();
        let mid = single(Joint::RightKnee, 0.5, 0.5, 0.30);
        assert!(stabilizer.ingest(Some(&mid), 0.0).is_none());
        assert!(stabilizer.ingest(Some(&mid), 0.05).is_none());
    }

    #[test]
    fn test_hold_keeps_joint_visible_for_short_dropouts() {
        let mut stabilizer = PoseStabilizer::new(StabilizerConfig {
            smoothing_alpha: 1.0,
            ..Default::default()
        });

        let pose = single(Joint::LeftElbow, 0.4, 0.4, 0.9);
        assert!(stabilizer.ingest(Some(&pose), 0.0).is_some());

        let held = stabilizer.ingest(None, 0.10).expect("held within window");
        let elbow = held.joint(Joint::LeftElbow).expect("elbow held");
        assert_eq!(elbow.confidence, 1.0);
        assert!((elbow.location.x - 0.4).abs() < 1e-9);

        assert!(stabilizer.ingest(None, 0.25).is_none());
    }

    #[test]
    fn test_low_confidence_hides_only_after_hold() {
        let mut stabilizer = PoseStabilizer::default();
        stabilizer.ingest(Some(&single(Joint::LeftHip, 0.5, 0.5, 0.9)), 0.0);

        // Low confidence still refreshes last_seen_at, so the joint stays on.
        let weak = single(Joint::LeftHip, 0.5, 0.5, 0.1);
        assert!(stabilizer.ingest(Some(&weak), 0.1).is_some());

        // Absent joint does not refresh; once past the hold window it is dropped.
        let other = single(Joint::RightHip, 0.5, 0.5, 0.9);
        let out = stabilizer.ingest(Some(&other), 0.35).expect("right hip visible");
        assert!(out.joint(Joint::LeftHip).is_none());
    }

    #[test]
    fn test_smoothing_moves_toward_measurement() {
        let mut stabilizer = PoseStabilizer::new(StabilizerConfig {
            on_confidence_threshold: 0.0,
            off_confidence_threshold: 0.0,
            hold_duration: 1.0,
            smoothing_alpha: 0.5,
        });

        stabilizer.ingest(Some(&single(Joint::RightWrist, 0.0, 0.0, 1.0)), 0.0);
        let out = stabilizer
            .ingest(Some(&single(Joint::RightWrist, 1.0, 1.0, 1.0)), 0.05)
            .expect("visible");
        let location = out.joint(Joint::RightWrist).expect("wrist").location;
        assert!((location.x - 0.5).abs() < 1e-4);
        assert!((location.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_hidden_joint_uses_faster_alpha() {
        let mut stabilizer = PoseStabilizer::new(StabilizerConfig {
            hold_duration: 1.0,
            smoothing_alpha: 0.3,
            ..Default::default()
        });

        // Dead-zone confidence: tracked but not visible.
        stabilizer.ingest(Some(&single(Joint::LeftAnkle, 0.0, 0.0, 0.3)), 0.0);
        stabilizer.ingest(Some(&single(Joint::LeftAnkle, 1.0, 0.0, 0.3)), 0.05);

        // Turning on applies the visible alpha on top of the hidden-alpha estimate (0.5).
        let out = stabilizer
            .ingest(Some(&single(Joint::LeftAnkle, 1.0, 0.0, 0.9)), 0.10)
            .expect("visible");
        let x = out.joint(Joint::LeftAnkle).expect("ankle").location.x;
        assert!((x - (0.5 * 0.7 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_reset_matches_fresh_instance() {
        let mut stabilizer = PoseStabilizer::default();
        stabilizer.ingest(Some(&single(Joint::LeftWrist, 0.2, 0.2, 0.9)), 0.0);
        stabilizer.reset();

        let fresh = PoseStabilizer::default();
        assert_eq!(stabilizer.joint_states, fresh.joint_states);
        assert!(stabilizer.ingest(None, 0.01).is_none());
    }
}

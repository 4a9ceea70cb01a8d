// src/pose.rs - Joint identities and per-frame pose observations
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Body landmarks tracked per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 12] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    pub fn from_name(name: &str) -> Option<Joint> {
        Joint::ALL.iter().copied().find(|joint| joint.name() == name)
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detection: normalized image-space location plus detector confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointObservation {
    pub location: Point2<f64>,
    pub confidence: f64,
}

impl JointObservation {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            location: Point2::new(x, y),
            confidence,
        }
    }
}

/// Joints detected in one frame. A missing entry means "not detected".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    joints: HashMap<Joint, JointObservation>,
}

impl Pose {
    pub fn new(joints: HashMap<Joint, JointObservation>) -> Self {
        Self { joints }
    }

    pub fn joint(&self, joint: Joint) -> Option<&JointObservation> {
        self.joints.get(&joint)
    }

    pub fn joints(&self) -> impl Iterator<Item = (Joint, &JointObservation)> {
        self.joints.iter().map(|(joint, obs)| (*joint, obs))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Flips the pose horizontally in normalized image space. Joint labels are kept.
    pub fn mirrored(&self) -> Pose {
        self.joints()
            .map(|(joint, obs)| {
                (
                    joint,
                    JointObservation::new(1.0 - obs.location.x, obs.location.y, obs.confidence),
                )
            })
            .collect()
    }

    /// Builder-style insert, handy for assembling synthetic poses.
    pub fn with(mut self, joint: Joint, observation: JointObservation) -> Self {
        self.joints.insert(joint, observation);
        self
    }
}

impl FromIterator<(Joint, JointObservation)> for Pose {
    fn from_iter<I: IntoIterator<Item = (Joint, JointObservation)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_names_round_trip() {
        for joint in Joint::ALL {
            assert_eq!(Joint::from_name(joint.name()), Some(joint));
        }
        assert_eq!(Joint::from_name("nose"), None);
    }

    #[test]
    fn test_missing_joint_is_none() {
        let pose = Pose::default().with(Joint::LeftWrist, JointObservation::new(0.4, 0.5, 0.9));
        assert!(pose.joint(Joint::LeftWrist).is_some());
        assert!(pose.joint(Joint::RightWrist).is_none());
        assert_eq!(pose.len(), 1);
    }
}

// src/detector.rs - Pose sources: synthetic runner and CSV pose logs
use crate::clock::Timestamp;
use crate::error::{Error, Result};
use crate::pose::{Joint, JointObservation, Pose};
use csv::{Reader, Writer};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Anything that turns a camera frame into body joints.
pub trait PoseDetecting {
    /// `Ok(None)` means the frame was processed and nobody was found.
    fn detect(&mut self, frame: &DynamicImage, now: Timestamp) -> Result<Option<Pose>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedRunnerConfig {
    pub steps_per_second: f64,
    /// Vertical wrist travel either side of rest, in normalized image units.
    pub arm_swing_amplitude: f64,
    pub knee_lift_amplitude: f64,
    pub confidence: f64,
    /// Drop every Nth frame. Zero disables dropouts.
    pub dropout_every: u64,
}

impl Default for SimulatedRunnerConfig {
    fn default() -> Self {
        Self {
            steps_per_second: 3.0,
            arm_swing_amplitude: 0.20,
            knee_lift_amplitude: 0.10,
            confidence: 0.9,
            dropout_every: 0,
        }
    }
}

/// Deterministic synthetic runner seen from the front. Ignores frame contents.
#[derive(Debug, Clone, Default)]
pub struct SimulatedRunner {
    pub config: SimulatedRunnerConfig,
    frame_count: u64,
}

impl SimulatedRunner {
    pub fn new(config: SimulatedRunnerConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn pose_at(&self, t: Timestamp) -> Pose {
        let c = self.config.confidence;
        // One arm cycle covers two steps.
        let phase = 2.0 * PI * (self.config.steps_per_second / 2.0) * t;
        let swing = self.config.arm_swing_amplitude * phase.sin();
        let lift = self.config.knee_lift_amplitude * phase.sin();

        Pose::default()
            .with(Joint::LeftShoulder, JointObservation::new(0.40, 0.70, c))
            .with(Joint::RightShoulder, JointObservation::new(0.60, 0.70, c))
            .with(Joint::LeftElbow, JointObservation::new(0.36, 0.58 + swing * 0.5, c))
            .with(Joint::RightElbow, JointObservation::new(0.64, 0.58 - swing * 0.5, c))
            .with(Joint::LeftWrist, JointObservation::new(0.35, 0.50 + swing, c))
            .with(Joint::RightWrist, JointObservation::new(0.65, 0.50 - swing, c))
            .with(Joint::LeftHip, JointObservation::new(0.44, 0.45, c))
            .with(Joint::RightHip, JointObservation::new(0.56, 0.45, c))
            .with(Joint::LeftKnee, JointObservation::new(0.44, 0.28 - lift, c))
            .with(Joint::RightKnee, JointObservation::new(0.56, 0.28 + lift, c))
            .with(Joint::LeftAnkle, JointObservation::new(0.44, 0.10 - lift * 0.5, c))
            .with(Joint::RightAnkle, JointObservation::new(0.56, 0.10 + lift * 0.5, c))
    }
}

impl PoseDetecting for SimulatedRunner {
    fn detect(&mut self, _frame: &DynamicImage, now: Timestamp) -> Result<Option<Pose>> {
        self.frame_count += 1;
        let every = self.config.dropout_every;
        if every > 0 && self.frame_count % every == 0 {
            return Ok(None);
        }
        Ok(Some(self.pose_at(now)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PoseLogRecord {
    frame: u64,
    timestamp: f64,
    joint: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    confidence: Option<f64>,
}

/// Appends detected poses to a CSV log, one row per joint.
pub struct PoseLogWriter {
    writer: Writer<File>,
    path: PathBuf,
    next_frame: u64,
}

impl PoseLogWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = Writer::from_path(&path)?;
        Ok(Self {
            writer,
            path,
            next_frame: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.next_frame
    }

    pub fn write_frame(&mut self, timestamp: Timestamp, pose: Option<&Pose>) -> Result<()> {
        let frame = self.next_frame;
        self.next_frame += 1;

        let observed: Vec<(Joint, &JointObservation)> = match pose {
            Some(pose) => Joint::ALL
                .iter()
                .filter_map(|joint| pose.joint(*joint).map(|obs| (*joint, obs)))
                .collect(),
            None => Vec::new(),
        };

        if observed.is_empty() {
            self.writer.serialize(PoseLogRecord {
                frame,
                timestamp,
                joint: None,
                x: None,
                y: None,
                confidence: None,
            })?;
            return Ok(());
        }

        for (joint, obs) in observed {
            self.writer.serialize(PoseLogRecord {
                frame,
                timestamp,
                joint: Some(joint.name().to_string()),
                x: Some(obs.location.x),
                y: Some(obs.location.y),
                confidence: Some(obs.confidence),
            })?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub timestamp: Timestamp,
    pub pose: Option<Pose>,
}

/// Replays a pose log frame by frame, one frame per `detect` call.
#[derive(Debug, Clone)]
pub struct RecordedPoseDetector {
    frames: Vec<RecordedFrame>,
    cursor: usize,
}

impl RecordedPoseDetector {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)?;
        let mut frames: Vec<RecordedFrame> = Vec::new();
        let mut current_frame: Option<u64> = None;

        for (index, row) in reader.deserialize::<PoseLogRecord>().enumerate() {
            let row_number = index + 1;
            let record = row?;
            let malformed = |message: String| Error::PoseLog {
                path: path.to_path_buf(),
                row: row_number,
                message,
            };

            if current_frame != Some(record.frame) {
                current_frame = Some(record.frame);
                frames.push(RecordedFrame {
                    timestamp: record.timestamp,
                    pose: None,
                });
            }

            let Some(name) = record.joint.as_deref().filter(|name| !name.is_empty()) else {
                continue;
            };
            let joint = Joint::from_name(name)
                .ok_or_else(|| malformed(format!("unknown joint '{name}'")))?;
            let (Some(x), Some(y), Some(confidence)) = (record.x, record.y, record.confidence) else {
                return Err(malformed(format!("joint '{name}' is missing coordinates")));
            };

            if let Some(frame) = frames.last_mut() {
                let pose = frame.pose.take().unwrap_or_default();
                frame.pose = Some(pose.with(joint, JointObservation::new(x, y, confidence)));
            }
        }

        info!(path = %path.display(), frames = frames.len(), "pose log loaded");
        Ok(Self::new(frames))
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Timestamp the next frame was recorded at.
    pub fn next_timestamp(&self) -> Option<Timestamp> {
        self.frames.get(self.cursor).map(|f| f.timestamp)
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl PoseDetecting for RecordedPoseDetector {
    fn detect(&mut self, _frame: &DynamicImage, _now: Timestamp) -> Result<Option<Pose>> {
        let Some(frame) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        if self.cursor == self.frames.len() {
            debug!("pose log exhausted");
        }
        Ok(frame.pose.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::running::ArmPhase;

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_simulated_runner_swings_arms() {
        let runner = SimulatedRunner::default();
        // Quarter and three-quarter arm cycle at 1.5 Hz.
        let left_up = runner.pose_at(1.0 / 6.0);
        let right_up = runner.pose_at(0.5);
        assert_eq!(ArmPhase::from_pose(Some(&left_up), 0.06), ArmPhase::LeftUp);
        assert_eq!(ArmPhase::from_pose(Some(&right_up), 0.06), ArmPhase::RightUp);
        assert_eq!(left_up.len(), 12);
    }

    #[test]
    fn test_simulated_runner_dropout() {
        let mut runner = SimulatedRunner::new(SimulatedRunnerConfig {
            dropout_every: 3,
            ..Default::default()
        });
        let frame = blank();
        let detected: Vec<bool> = (0..6)
            .map(|i| runner.detect(&frame, i as f64 * 0.05).unwrap().is_some())
            .collect();
        assert_eq!(detected, vec![true, true, false, true, true, false]);
        assert_eq!(runner.frame_count(), 6);
    }

    #[test]
    fn test_pose_log_replays_written_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.csv");
        let runner = SimulatedRunner::default();

        let mut writer = PoseLogWriter::create(&path).unwrap();
        writer.write_frame(0.0, Some(&runner.pose_at(0.0))).unwrap();
        writer.write_frame(0.05, None).unwrap();
        writer.write_frame(0.10, Some(&runner.pose_at(0.10))).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.frames_written(), 3);

        let mut replay = RecordedPoseDetector::open(&path).unwrap();
        assert_eq!(replay.remaining(), 3);
        assert_eq!(replay.next_timestamp(), Some(0.0));

        let frame = blank();
        let first = replay.detect(&frame, 0.0).unwrap().unwrap();
        assert_eq!(first.len(), 12);
        assert!(replay.detect(&frame, 0.05).unwrap().is_none());
        let third = replay.detect(&frame, 0.10).unwrap().unwrap();
        let expected = runner.pose_at(0.10);
        let got = third.joint(Joint::LeftWrist).unwrap();
        let want = expected.joint(Joint::LeftWrist).unwrap();
        assert!((got.location.y - want.location.y).abs() < 1e-12);

        assert!(replay.is_finished());
        assert!(replay.detect(&frame, 0.15).unwrap().is_none());
    }

    #[test]
    fn test_pose_log_rejects_unknown_joint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "frame,timestamp,joint,x,y,confidence\n0,0.0,left_wrist,0.1,0.2,0.9\n0,0.0,nose,0.5,0.5,0.9\n",
        )
        .unwrap();

        match RecordedPoseDetector::open(&path) {
            Err(Error::PoseLog { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected pose log error, got {other:?}"),
        }
    }
}

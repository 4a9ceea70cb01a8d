// src/lib.rs - Running-motion estimation and endless-runner scene driving
pub mod clock;
pub mod config;
pub mod data;
pub mod detector;
pub mod error;
pub mod pose;
pub mod runner;
pub mod running;
pub mod scene;
pub mod session;
pub mod shared;
pub mod stabilizer;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{AppConfig, RunnerSettings};
pub use data::SessionExporter;
pub use detector::{PoseDetecting, RecordedPoseDetector, SimulatedRunner};
pub use error::{Error, Result};
pub use pose::{Joint, JointObservation, Pose};
pub use session::{RunnerSession, SessionFrame};
pub use shared::{MotionCell, SnapshotCell, TuningCell};
pub use stabilizer::PoseStabilizer;

// src/scene/mod.rs
pub mod driver;
pub mod graph;
pub mod terrain;
pub mod tuning;

pub use driver::{FrameReport, RunnerSceneDriver};
pub use graph::{CameraPlacement, HeadlessScene, RunnerAnimationState, RunnerClip, RunnerPlacement, SceneGraph, TileId};
pub use terrain::{Segment, TerrainError, TerrainSegmentPool};
pub use tuning::{CadenceTuning, CameraTuning, RunnerTuning, SceneTuning, TerrainConfig};

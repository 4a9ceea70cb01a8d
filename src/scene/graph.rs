// src/scene/graph.rs - Narrow node-graph capability the scene driver renders through
use crate::runner::RunnerAnimationBlend;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::trace;

pub type TileId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerClip {
    Idle,
    SlowRun,
    FastRun,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPlacement {
    pub position: Vector3<f64>,
    pub look_at: Vector3<f64>,
    pub field_of_view_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerPlacement {
    pub position: Vector3<f64>,
    /// Uniform model scale.
    pub scale: f64,
    pub yaw_radians: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerAnimationState {
    pub blend: RunnerAnimationBlend,
    pub slow_run_rate: f64,
    pub fast_run_rate: f64,
}

impl RunnerAnimationState {
    pub const IDLE: RunnerAnimationState = RunnerAnimationState {
        blend: RunnerAnimationBlend::IDLE,
        slow_run_rate: 1.0,
        fast_run_rate: 1.0,
    };
}

/// What the driver needs from a rendering engine. Tiles are owned by the engine;
/// the driver only repositions them.
pub trait SceneGraph {
    fn spawn_segment(&mut self, start_z: f64, length: f64, width: f64) -> TileId;
    fn move_segment(&mut self, tile: TileId, start_z: f64);
    fn place_runner(&mut self, runner: RunnerPlacement);
    fn place_camera(&mut self, camera: CameraPlacement);
    fn apply_animation(&mut self, animation: RunnerAnimationState);
    /// Loop length in seconds of a runner clip, if the asset provides it.
    fn clip_duration(&self, clip: RunnerClip) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileState {
    pub start_z: f64,
    pub length: f64,
    pub width: f64,
    pub moves: u32,
}

/// Scene graph with no renderer behind it. Keeps the last state it was given.
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    pub tiles: Vec<TileState>,
    pub runner: Option<RunnerPlacement>,
    pub camera: Option<CameraPlacement>,
    pub animation: Option<RunnerAnimationState>,
    clip_durations: HashMap<RunnerClip, f64>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip_duration(mut self, clip: RunnerClip, seconds: f64) -> Self {
        self.clip_durations.insert(clip, seconds);
        self
    }

    /// Tile start positions sorted along the direction of travel.
    pub fn sorted_tile_starts(&self) -> Vec<f64> {
        let mut starts: Vec<f64> = self.tiles.iter().map(|t| t.start_z).collect();
        starts.sort_by(f64::total_cmp);
        starts
    }
}

impl SceneGraph for HeadlessScene {
    fn spawn_segment(&mut self, start_z: f64, length: f64, width: f64) -> TileId {
        self.tiles.push(TileState {
            start_z,
            length,
            width,
            moves: 0,
        });
        self.tiles.len() - 1
    }

    fn move_segment(&mut self, tile: TileId, start_z: f64) {
        if let Some(state) = self.tiles.get_mut(tile) {
            trace!(tile, start_z, "tile moved");
            state.start_z = start_z;
            state.moves += 1;
        }
    }

    fn place_runner(&mut self, runner: RunnerPlacement) {
        self.runner = Some(runner);
    }

    fn place_camera(&mut self, camera: CameraPlacement) {
        self.camera = Some(camera);
    }

    fn apply_animation(&mut self, animation: RunnerAnimationState) {
        self.animation = Some(animation);
    }

    fn clip_duration(&self, clip: RunnerClip) -> Option<f64> {
        self.clip_durations.get(&clip).copied()
    }
}

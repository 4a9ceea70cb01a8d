// src/scene/driver.rs - Render-tick consumer: motion in, camera/terrain/animation out
use super::graph::{CameraPlacement, RunnerAnimationState, RunnerClip, RunnerPlacement, SceneGraph, TileId};
use super::terrain::{TerrainError, TerrainSegmentPool};
use super::tuning::{SceneTuning, TerrainConfig};
use crate::runner::blender::clamp_rate;
use crate::runner::{RunnerAnimationBlender, RunnerMotion};
use crate::shared::{MotionCell, TuningCell};
use nalgebra::Vector3;
use std::collections::VecDeque;
use tracing::debug;

const DEFAULT_TICK_INTERVAL: f64 = 1.0 / 60.0;
const MIN_STEPS_PER_LOOP: f64 = 0.1;
/// Clip length assumed when the scene cannot report one.
const FALLBACK_CLIP_DURATION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub dt: f64,
    pub travel_z: f64,
    pub displayed_speed_meters_per_second: f64,
    pub displayed_cadence_steps_per_second: f64,
    pub animation: RunnerAnimationState,
    pub camera: CameraPlacement,
    pub recycled: Vec<f64>,
}

pub struct RunnerSceneDriver {
    terrain: TerrainConfig,
    initial_pool: TerrainSegmentPool,
    pool: TerrainSegmentPool,
    tiles: VecDeque<TileId>,

    motion: MotionCell,
    tuning: TuningCell,

    last_time: Option<f64>,
    displayed_cadence_steps_per_second: f64,
    displayed_speed_meters_per_second: f64,
    travel_z: f64,
}

impl RunnerSceneDriver {
    pub fn new(terrain: TerrainConfig, motion: MotionCell, tuning: TuningCell) -> Result<Self, TerrainError> {
        let pool = TerrainSegmentPool::new(terrain.active_segments, terrain.segment_length)?;
        Ok(Self {
            terrain,
            initial_pool: pool.clone(),
            pool,
            tiles: VecDeque::with_capacity(terrain.active_segments),
            motion,
            tuning,
            last_time: None,
            displayed_cadence_steps_per_second: 0.0,
            displayed_speed_meters_per_second: 0.0,
            travel_z: 0.0,
        })
    }

    pub fn motion_cell(&self) -> MotionCell {
        self.motion.clone()
    }

    pub fn set_motion(&self, motion: RunnerMotion) {
        self.motion.store(motion.sanitized());
    }

    pub fn tuning(&self) -> SceneTuning {
        self.tuning.load()
    }

    pub fn set_tuning(&self, tuning: SceneTuning) {
        self.tuning.store(tuning);
    }

    pub fn pool(&self) -> &TerrainSegmentPool {
        &self.pool
    }

    pub fn travel_z(&self) -> f64 {
        self.travel_z
    }

    pub fn displayed_speed(&self) -> f64 {
        self.displayed_speed_meters_per_second
    }

    /// Spawns one tile per pool segment and places the camera and runner.
    pub fn install(&mut self, scene: &mut dyn SceneGraph) {
        if self.tiles.is_empty() {
            for segment in self.pool.segments() {
                let tile = scene.spawn_segment(
                    segment.start_z,
                    self.terrain.segment_length,
                    self.terrain.segment_width,
                );
                self.tiles.push_back(tile);
            }
        } else {
            self.place_tiles(scene);
        }

        let tuning = self.tuning.load();
        let runner = runner_placement(&tuning, self.travel_z);
        scene.place_runner(runner);
        scene.place_camera(camera_placement(&tuning, runner.position, 0.0, 0.0));
        scene.apply_animation(RunnerAnimationState::IDLE);
    }

    pub fn reset(&mut self, scene: &mut dyn SceneGraph) {
        self.last_time = None;
        self.motion.store(RunnerMotion::ZERO);
        self.displayed_cadence_steps_per_second = 0.0;
        self.displayed_speed_meters_per_second = 0.0;
        self.travel_z = 0.0;
        self.pool = self.initial_pool.clone();
        self.install(scene);
    }

    pub fn tick(&mut self, time: f64, scene: &mut dyn SceneGraph) -> FrameReport {
        let tuning = self.tuning.load();

        let dt = match self.last_time {
            Some(last) => (time - last).max(0.0),
            None => DEFAULT_TICK_INTERVAL,
        };
        self.last_time = Some(time);

        let motion = self.motion.load();
        let cadence_alpha = tuning.cadence.smoothing_alpha.clamp(0.0, 1.0);
        let speed_alpha = tuning.speed_smoothing_alpha.clamp(0.0, 1.0);

        self.displayed_cadence_steps_per_second +=
            (motion.cadence_steps_per_second - self.displayed_cadence_steps_per_second) * cadence_alpha;
        let target_speed =
            self.displayed_cadence_steps_per_second * tuning.cadence.stride_length_meters_per_step.max(0.0);
        self.displayed_speed_meters_per_second +=
            (target_speed - self.displayed_speed_meters_per_second) * speed_alpha;

        let animation = self.animate(&tuning, scene);

        self.travel_z += self.displayed_speed_meters_per_second * dt;

        let speed = self.displayed_speed_meters_per_second;
        let camera_tuning = &tuning.camera;
        let bob_amplitude = camera_tuning
            .bob_max_amplitude
            .min(speed * camera_tuning.bob_speed_to_amplitude_gain);
        let sway_amplitude = camera_tuning
            .sway_max_amplitude
            .min(speed * camera_tuning.sway_speed_to_amplitude_gain);
        let bob = (time * camera_tuning.bob_frequency).sin() * bob_amplitude;
        let sway = (time * camera_tuning.sway_frequency).cos() * sway_amplitude;

        let runner = runner_placement(&tuning, self.travel_z);
        let camera = camera_placement(&tuning, runner.position, bob, sway);
        scene.place_runner(runner);
        scene.place_camera(camera);

        let progress_z = self.travel_z + tuning.runner.ahead_offset_z;
        let recycled = self.pool.recycle_if_needed(progress_z);
        for &start_z in &recycled {
            let Some(tile) = self.tiles.pop_front() else {
                continue;
            };
            scene.move_segment(tile, start_z);
            self.tiles.push_back(tile);
        }
        if !recycled.is_empty() {
            debug!(travel_z = self.travel_z, tiles = recycled.len(), "terrain advanced");
        }

        FrameReport {
            dt,
            travel_z: self.travel_z,
            displayed_speed_meters_per_second: speed,
            displayed_cadence_steps_per_second: self.displayed_cadence_steps_per_second,
            animation,
            camera,
            recycled,
        }
    }

    fn animate(&self, tuning: &SceneTuning, scene: &mut dyn SceneGraph) -> RunnerAnimationState {
        let blender = RunnerAnimationBlender::new(tuning.blender);
        let blend = blender.blend(self.displayed_speed_meters_per_second);

        let steps_per_loop = tuning.cadence.steps_per_loop.max(MIN_STEPS_PER_LOOP);
        let loops_per_second = self.displayed_cadence_steps_per_second / steps_per_loop;

        let rate = |clip: RunnerClip| {
            if loops_per_second <= 0.0 {
                return 1.0;
            }
            let duration = scene
                .clip_duration(clip)
                .unwrap_or(FALLBACK_CLIP_DURATION)
                .max(0.0001);
            clamp_rate(
                loops_per_second * duration,
                tuning.blender.min_playback_rate,
                tuning.blender.max_playback_rate,
            )
        };

        let state = RunnerAnimationState {
            blend,
            slow_run_rate: rate(RunnerClip::SlowRun),
            fast_run_rate: rate(RunnerClip::FastRun),
        };
        scene.apply_animation(state);
        state
    }

    fn place_tiles(&self, scene: &mut dyn SceneGraph) {
        for (tile, segment) in self.tiles.iter().zip(self.pool.segments()) {
            scene.move_segment(*tile, segment.start_z);
        }
    }
}

fn runner_placement(tuning: &SceneTuning, travel_z: f64) -> RunnerPlacement {
    RunnerPlacement {
        position: Vector3::new(
            tuning.runner.x,
            tuning.runner.additional_ground_offset_y,
            travel_z + tuning.runner.ahead_offset_z,
        ),
        scale: tuning.runner.scale.max(0.0),
        yaw_radians: tuning.runner.yaw_radians,
    }
}

fn camera_placement(tuning: &SceneTuning, runner: Vector3<f64>, bob: f64, sway: f64) -> CameraPlacement {
    CameraPlacement {
        position: Vector3::new(
            tuning.camera.base_x + sway,
            tuning.camera.height_y + bob,
            runner.z - tuning.camera.back_offset_z,
        ),
        look_at: Vector3::new(runner.x, tuning.camera.look_at_height_y, runner.z),
        field_of_view_degrees: tuning.camera.field_of_view_degrees,
    }
}

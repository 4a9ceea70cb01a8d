// src/runner/mod.rs
pub mod blender;
pub mod motion;

pub use blender::{BlenderConfig, RunnerAnimationBlend, RunnerAnimationBlender};
pub use motion::RunnerMotion;

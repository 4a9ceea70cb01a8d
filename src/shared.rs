// src/shared.rs - Latest-value handoff between the frame tick and the render tick
use crate::runner::RunnerMotion;
use crate::scene::SceneTuning;
use std::sync::{Arc, Mutex, PoisonError};

/// A small `Copy` value behind its own mutex. The lock is held only while the
/// value is copied in or out, never across a tick.
#[derive(Debug, Default)]
pub struct SnapshotCell<T: Copy> {
    value: Arc<Mutex<T>>,
}

impl<T: Copy> SnapshotCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
        }
    }

    pub fn load(&self) -> T {
        // A panicked writer cannot leave a torn `Copy` value behind.
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self, value: T) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl<T: Copy> Clone for SnapshotCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

pub type MotionCell = SnapshotCell<RunnerMotion>;
pub type TuningCell = SnapshotCell<SceneTuning>;

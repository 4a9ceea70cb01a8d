// src/scene/terrain.rs - Fixed-size ring of ground segments
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TerrainError {
    #[error("terrain pool needs at least one segment")]
    NoSegments,
    #[error("segment length must be positive and finite, got {0}")]
    InvalidSegmentLength(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_z: f64,
}

/// Keeps `active_segments` tiles ahead of the camera, recycling the one furthest behind.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSegmentPool {
    segment_length: f64,
    segments: VecDeque<Segment>,
    last_generated_z: f64,
}

impl TerrainSegmentPool {
    pub fn new(active_segments: usize, segment_length: f64) -> Result<Self, TerrainError> {
        if active_segments == 0 {
            return Err(TerrainError::NoSegments);
        }
        if !(segment_length.is_finite() && segment_length > 0.0) {
            return Err(TerrainError::InvalidSegmentLength(segment_length));
        }

        let segments = (0..active_segments)
            .map(|i| Segment {
                start_z: i as f64 * segment_length,
            })
            .collect();

        Ok(Self {
            segment_length,
            segments,
            last_generated_z: active_segments as f64 * segment_length,
        })
    }

    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    pub fn segments(&self) -> impl ExactSizeIterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn start_positions(&self) -> Vec<f64> {
        self.segments.iter().map(|s| s.start_z).collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_generated_z(&self) -> f64 {
        self.last_generated_z
    }

    /// Recycles segments until the camera is at least one segment away from the end
    /// of the generated runway. Returns the start of every segment created.
    ///
    /// A jump longer than the whole pool skips the runway forward in one step, so at
    /// most `len()` segments are created per call.
    pub fn recycle_if_needed(&mut self, camera_z: f64) -> Vec<f64> {
        let mut recycled = Vec::new();
        if !camera_z.is_finite() {
            return recycled;
        }

        let length = self.segment_length;
        let capacity = self.segments.len();
        let needed = ((camera_z + 2.0 * length - self.last_generated_z) / length).ceil();
        if needed > capacity as f64 {
            let skipped = needed - capacity as f64;
            self.last_generated_z += skipped * length;
            debug!(skipped, "terrain jumped ahead");
        }

        for _ in 0..capacity {
            if camera_z + length <= self.last_generated_z - length {
                break;
            }
            let new_start_z = self.last_generated_z;
            self.last_generated_z += length;

            self.segments.pop_front();
            self.segments.push_back(Segment {
                start_z: new_start_z,
            });
            recycled.push(new_start_z);
        }

        if !recycled.is_empty() {
            debug!(count = recycled.len(), last_generated_z = self.last_generated_z, "recycled terrain");
        }
        recycled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(pool: &TerrainSegmentPool) {
        let starts = pool.start_positions();
        for pair in starts.windows(2) {
            assert!((pair[1] - pair[0] - pool.segment_length()).abs() < 1e-9);
        }
        let last = starts.last().copied().unwrap_or_default();
        assert!((pool.last_generated_z() - (last + pool.segment_length())).abs() < 1e-9);
    }

    #[test]
    fn test_initial_segments_are_contiguous() {
        let pool = TerrainSegmentPool::new(5, 10.0).unwrap();
        assert_eq!(pool.start_positions(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(pool.last_generated_z(), 50.0);
        assert_contiguous(&pool);
    }

    #[test]
    fn test_no_recycle_near_start() {
        let mut pool = TerrainSegmentPool::new(5, 10.0).unwrap();
        assert!(pool.recycle_if_needed(0.0).is_empty());
        assert!(pool.recycle_if_needed(30.0).is_empty());
    }

    #[test]
    fn test_recycle_keeps_count_constant() {
        let mut pool = TerrainSegmentPool::new(5, 10.0).unwrap();
        let recycled = pool.recycle_if_needed(35.0);
        assert_eq!(recycled, vec![50.0]);
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.start_positions(), vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(pool.last_generated_z(), 60.0);
    }

    #[test]
    fn test_camera_jump_recycles_multiple_segments() {
        let mut pool = TerrainSegmentPool::new(3, 10.0).unwrap();
        let recycled = pool.recycle_if_needed(100.0);
        assert!(recycled.len() > 1);
        assert_eq!(pool.len(), 3);
        assert_contiguous(&pool);
        assert!(100.0 + 10.0 <= pool.last_generated_z() - 10.0);
    }

    #[test]
    fn test_huge_jump_is_bounded_by_pool_size() {
        let mut pool = TerrainSegmentPool::new(4, 10.0).unwrap();
        let recycled = pool.recycle_if_needed(1e12);
        assert_eq!(recycled.len(), 4);
        assert_eq!(pool.len(), 4);
        assert_contiguous(&pool);
        assert!(1e12 + 10.0 <= pool.last_generated_z() - 10.0);

        // Past float resolution the call still returns.
        let recycled = pool.recycle_if_needed(1e300);
        assert!(recycled.len() <= 4);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_rejects_degenerate_construction() {
        assert_eq!(TerrainSegmentPool::new(0, 10.0), Err(TerrainError::NoSegments));
        assert!(matches!(
            TerrainSegmentPool::new(3, 0.0),
            Err(TerrainError::InvalidSegmentLength(_))
        ));
        assert!(TerrainSegmentPool::new(3, f64::NAN).is_err());
    }
}

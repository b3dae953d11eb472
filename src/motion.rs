use crate::bbox::BoundingBox;
use crate::math;
use nalgebra as na;

/// Constant-displacement motion model of one track.
///
/// `velocity` is the center-to-center displacement between the two most
/// recent confirmed observations, whatever the number of frames between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub velocity: na::Vector2<f32>,
}

impl Motion {
    pub fn new() -> Self {
        Self {
            velocity: na::Vector2::zeros(),
        }
    }

    /// Record a confirmed move from `prev` to `next`.
    #[inline]
    pub fn observe(&mut self, prev: &BoundingBox, next: &BoundingBox) {
        self.velocity = next.center() - prev.center();
    }

    /// Display offset `frames` frames after the last confirmed observation:
    /// `velocity * frames * base^frames`.
    #[inline]
    pub fn predict_offset(&self, frames: u64, decay_base: f32) -> na::Vector2<f32> {
        self.velocity * (frames as f32 * math::damping(decay_base, frames))
    }

    #[inline]
    pub fn predict(&self, from: &BoundingBox, frames: u64, decay_base: f32) -> BoundingBox {
        if frames == 0 {
            return *from;
        }

        from.translated(self.predict_offset(frames, decay_base))
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self::new()
    }
}

use crate::bbox::BoundingBox;
use nalgebra as na;

/// Euclidean distance between box centers.
#[inline]
pub fn distance(a: &BoundingBox, b: &BoundingBox) -> f32 {
    na::distance(&a.center(), &b.center())
}

/// Damping applied to a displacement `frames` frames after the last
/// confirmed observation: `base^frames`.
#[inline]
pub fn damping(base: f32, frames: u64) -> f32 {
    base.powi(frames.min(i32::MAX as u64) as i32)
}

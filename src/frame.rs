use serde_derive::Serialize;

use crate::track::ResolvedTrack;

/// Tracks visible on one processed frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Seconds since the start of the stream.
    pub timestamp: f32,
    /// Whether the detector ran on this frame.
    pub detected: bool,
    pub tracks: Vec<ResolvedTrack>,
}

impl FrameReport {
    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTrack> {
        self.tracks.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

use std::collections::BTreeMap;
use std::fmt;

use nalgebra as na;
use serde::{Serialize, Serializer};

use crate::attributes::Attributes;
use crate::bbox::BoundingBox;
use crate::emotion::EmotionState;
use crate::history::History;
use crate::motion::Motion;

/// Number of confirmed boxes kept per track.
pub const HISTORY_LEN: usize = 5;

/// Identity of one tracked face. Issued in increasing order, never reused
/// within a store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face_{:04}", self.0)
    }
}

impl Serialize for TrackId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone)]
pub struct TrackedFace {
    pub id: TrackId,
    /// Last confirmed box. Display predictions never overwrite it.
    pub bbox: BoundingBox,
    pub bbox_history: History<BoundingBox>,
    pub motion: Motion,
    pub attributes: Attributes,
    pub emotion: EmotionState,
    pub first_seen_frame: u64,
    pub last_seen_frame: u64,
}

impl TrackedFace {
    pub fn new(
        id: TrackId,
        bbox: BoundingBox,
        attributes: Attributes,
        emotion: EmotionState,
        frame_index: u64,
    ) -> Self {
        let mut bbox_history = History::with_capacity(HISTORY_LEN);
        bbox_history.push(bbox);

        Self {
            id,
            bbox,
            bbox_history,
            motion: Motion::new(),
            attributes,
            emotion,
            first_seen_frame: frame_index,
            last_seen_frame: frame_index,
        }
    }

    #[inline]
    pub fn frames_since_seen(&self, frame_index: u64) -> u64 {
        frame_index.saturating_sub(self.last_seen_frame)
    }

    #[inline]
    pub fn velocity(&self) -> na::Vector2<f32> {
        self.motion.velocity
    }

    /// Apply a detector-confirmed observation.
    pub fn confirm(&mut self, bbox: BoundingBox, frame_index: u64) {
        self.motion.observe(&self.bbox, &bbox);
        self.bbox = bbox;
        self.bbox_history.push(bbox);
        self.last_seen_frame = frame_index;
    }
}

/// Authoritative map from identity to track state.
#[derive(Debug)]
pub struct TrackStore {
    tracks: BTreeMap<TrackId, TrackedFace>,
    next_id: u64,
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates a track under a freshly issued id.
    pub fn create(
        &mut self,
        bbox: BoundingBox,
        attributes: Attributes,
        emotion: EmotionState,
        frame_index: u64,
    ) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;

        self.insert(TrackedFace::new(id, bbox, attributes, emotion, frame_index));

        id
    }

    fn insert(&mut self, face: TrackedFace) {
        let id = face.id;
        let previous = self.tracks.insert(id, face);

        assert!(previous.is_none(), "track id {} issued twice", id);
    }

    /// Drops every track unseen for more than `persistence_frames` frames.
    pub fn expire(&mut self, frame_index: u64, persistence_frames: u64) -> Vec<TrackId> {
        let mut expired = Vec::new();

        self.tracks.retain(|id, t| {
            let keep = t.frames_since_seen(frame_index) <= persistence_frames;
            if !keep {
                expired.push(*id);
            }
            keep
        });

        expired
    }

    /// Forgets every track and restarts id issuance.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
    }

    #[inline]
    pub fn get(&self, id: TrackId) -> Option<&TrackedFace> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut TrackedFace> {
        self.tracks.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Tracks in id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ TrackedFace> {
        self.tracks.values()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &'_ mut TrackedFace> {
        self.tracks.values_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Id the next created track will receive.
    #[inline]
    pub fn next_id(&self) -> TrackId {
        TrackId(self.next_id)
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

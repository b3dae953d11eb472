use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::info;

use crate::attributes::AttributeEstimator;
use crate::bbox::BoundingBox;
use crate::engine::FaceTracker;
use crate::error::Result;
use crate::rng::RandomSource;
use crate::track::ResolvedTrack;

/// Independent trackers keyed by source name (camera, file, ...).
///
/// A tracker is built by `factory` the first time its source is seen. Streams
/// share nothing; each keeps its own ids and frame sequence.
pub struct StreamTracker<E, R, F> {
    streams: HashMap<String, FaceTracker<E, R>>,
    factory: F,
}

impl<E, R, F> StreamTracker<E, R, F>
where
    E: AttributeEstimator,
    R: RandomSource,
    F: FnMut(&str) -> Result<FaceTracker<E, R>>,
{
    pub fn new(factory: F) -> Self {
        Self {
            streams: HashMap::new(),
            factory,
        }
    }

    pub fn advance(
        &mut self,
        src: &str,
        frame_index: u64,
        detections: Option<&[BoundingBox]>,
    ) -> Result<Vec<ResolvedTrack>> {
        let tracker = match self.streams.entry(src.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let tracker = (self.factory)(src)?;
                info!(src, "stream opened");

                entry.insert(tracker)
            }
        };

        tracker.advance(frame_index, detections)
    }

    #[inline]
    pub fn get(&self, src: &str) -> Option<&FaceTracker<E, R>> {
        self.streams.get(src)
    }

    /// Resets one stream, keeping it registered.
    pub fn reset(&mut self, src: &str) {
        if let Some(tracker) = self.streams.get_mut(src) {
            tracker.reset();
        }
    }

    pub fn remove(&mut self, src: &str) -> Option<FaceTracker<E, R>> {
        self.streams.remove(src)
    }

    #[inline]
    pub fn sources(&self) -> impl Iterator<Item = &'_ str> {
        self.streams.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

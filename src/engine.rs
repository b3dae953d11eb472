//! Per-frame association, prediction and expiry of face tracks.
//!
//! Each call to [`FaceTracker::advance`] runs, in order:
//!
//! 1. expiry of tracks unseen for more than `persistence_frames`;
//! 2. greedy matching of the fresh detections, in input order, each to the
//!    nearest still-unclaimed track under `max_match_distance`;
//! 3. creation of a track per unmatched detection;
//! 4. damped prediction for tracks not confirmed this frame;
//! 5. emotion evolution and reporting of tracks seen within `report_window`.
//!
//! Matching is not globally optimal: an early detection may claim the
//! nearest track of a later one.

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::attributes::{AttributeEstimator, Attributes, SimulatedEstimator};
use crate::bbox::BoundingBox;
use crate::config::TrackerConfig;
use crate::emotion::EmotionDynamics;
use crate::error::{Error, Result};
use crate::math;
use crate::rng::{RandomSource, RngSource};
use crate::store::{TrackId, TrackStore};
use crate::track::ResolvedTrack;

pub struct FaceTracker<E, R = RngSource<StdRng>> {
    config: TrackerConfig,
    store: TrackStore,
    estimator: E,
    dynamics: EmotionDynamics<R>,
    last_frame: Option<u64>,
}

impl FaceTracker<SimulatedEstimator<RngSource<StdRng>>> {
    /// Tracker seeding attributes with the simulated estimator, both random
    /// streams drawn from OS entropy.
    pub fn simulated(config: TrackerConfig) -> Result<Self> {
        Self::new(
            config,
            SimulatedEstimator::new(RngSource::from_entropy()),
            RngSource::from_entropy(),
        )
    }

    /// Fully reproducible variant of [`FaceTracker::simulated`].
    pub fn seeded(config: TrackerConfig, seed: u64) -> Result<Self> {
        Self::new(
            config,
            SimulatedEstimator::new(RngSource::seeded(seed)),
            RngSource::seeded(seed.wrapping_add(1)),
        )
    }
}

impl<E: AttributeEstimator, R: RandomSource> FaceTracker<E, R> {
    pub fn new(config: TrackerConfig, estimator: E, rng: R) -> Result<Self> {
        config.validate()?;

        let dynamics = EmotionDynamics::new(rng, config.emotion_stability_range.clone());

        Ok(Self {
            config,
            store: TrackStore::new(),
            estimator,
            dynamics,
            last_frame: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Processes one frame. `detections` is `None` when the detector did not
    /// run on this frame and `Some` (possibly empty) when it did.
    ///
    /// A non-increasing `frame_index` or a malformed box refuses the whole
    /// call and leaves the tracker untouched.
    pub fn advance(
        &mut self,
        frame_index: u64,
        detections: Option<&[BoundingBox]>,
    ) -> Result<Vec<ResolvedTrack>> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(Error::NonMonotonicFrame {
                    last,
                    got: frame_index,
                });
            }
        }

        for (index, bbox) in detections.unwrap_or_default().iter().enumerate() {
            bbox.check().map_err(|reason| Error::InvalidBBox {
                index,
                bbox: *bbox,
                reason,
            })?;
        }

        self.last_frame = Some(frame_index);

        for id in self
            .store
            .expire(frame_index, self.config.persistence_frames)
        {
            debug!(track = %id, frame = frame_index, "track expired");
        }

        if let Some(detections) = detections {
            for bbox in self.match_detections(frame_index, detections) {
                self.spawn(frame_index, bbox);
            }
        }

        Ok(self.resolve(frame_index))
    }

    /// Confirms tracks with the detections they are nearest to, returning the
    /// detections left unmatched, in input order.
    fn match_detections(
        &mut self,
        frame_index: u64,
        detections: &[BoundingBox],
    ) -> Vec<BoundingBox> {
        let mut claimed: Vec<TrackId> = Vec::with_capacity(detections.len());
        let mut unmatched = Vec::new();

        for det in detections {
            let best = self
                .store
                .iter()
                .filter(|t| !claimed.contains(&t.id))
                .map(|t| (t.id, math::distance(det, &t.bbox)))
                .fold(None, |best: Option<(TrackId, f32)>, (id, dist)| match best {
                    Some((_, best_dist)) if best_dist <= dist => best,
                    _ => Some((id, dist)),
                });

            match best {
                Some((id, dist)) if dist < self.config.max_match_distance => {
                    if let Some(face) = self.store.get_mut(id) {
                        face.confirm(*det, frame_index);
                        debug!(track = %id, frame = frame_index, dist, "track matched");
                    }
                    claimed.push(id);
                }
                _ => unmatched.push(*det),
            }
        }

        unmatched
    }

    fn spawn(&mut self, frame_index: u64, bbox: BoundingBox) {
        let attributes = match self.estimator.estimate(frame_index, &bbox) {
            Ok(attributes) => attributes,
            Err(err) => {
                warn!(frame = frame_index, error = %err, "attribute estimation failed");
                Attributes::unavailable()
            }
        };

        let emotion = self.dynamics.seed(attributes.emotion_baseline, frame_index);
        let id = self.store.create(bbox, attributes, emotion, frame_index);

        debug!(
            track = %id,
            frame = frame_index,
            x = bbox.x,
            y = bbox.y,
            emotion = %attributes.emotion_baseline,
            "track created"
        );
    }

    fn resolve(&mut self, frame_index: u64) -> Vec<ResolvedTrack> {
        let Self {
            config,
            store,
            dynamics,
            ..
        } = self;

        let mut resolved = Vec::with_capacity(store.len());

        for face in store.iter_mut() {
            let since = face.frames_since_seen(frame_index);
            if since > config.report_window {
                continue;
            }

            let bbox = face
                .motion
                .predict(&face.bbox, since, config.velocity_damping_base);

            let before = face.emotion.current;
            let emotion = dynamics.step(&mut face.emotion, frame_index);
            if emotion != before {
                debug!(track = %face.id, frame = frame_index, from = %before, to = %emotion, "emotion changed");
            }

            resolved.push(ResolvedTrack {
                track_id: face.id,
                bbox,
                age_bucket: face.attributes.age_bucket,
                gender: face.attributes.gender,
                ethnicity: face.attributes.ethnicity,
                emotion,
                first_seen_frame: face.first_seen_frame,
                frames_since_seen: since,
            });
        }

        resolved
    }

    /// Drops every track, restarts id issuance and forgets the last frame.
    pub fn reset(&mut self) {
        info!(tracks = self.store.len(), "tracker reset");

        self.store.reset();
        self.last_frame = None;
    }
}

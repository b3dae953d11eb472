use serde_derive::Serialize;

use crate::attributes::{AgeBucket, Emotion, Ethnicity, Gender};
use crate::bbox::BoundingBox;
use crate::store::TrackId;

/// One visible face as reported for a frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub track_id: TrackId,
    /// Confirmed box, or the damped prediction when the face was not
    /// detected this frame.
    pub bbox: BoundingBox,
    pub age_bucket: AgeBucket,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub emotion: Emotion,
    pub first_seen_frame: u64,
    pub frames_since_seen: u64,
}

impl ResolvedTrack {
    #[inline]
    pub fn is_predicted(&self) -> bool {
        self.frames_since_seen > 0
    }
}

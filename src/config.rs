use std::ops::RangeInclusive;

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning of a [`FaceTracker`](crate::FaceTracker). Frame counts are in
/// frame-index units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// The detector runs on frames where `frame_index % detection_interval == 0`.
    pub detection_interval: u64,
    /// Center distance (px) under which a detection may continue a track.
    pub max_match_distance: f32,
    /// Frames a track survives without a confirmed detection.
    pub persistence_frames: u64,
    /// Frames a track keeps being reported after its last detection.
    pub report_window: u64,
    /// Per-frame decay of the predicted displacement.
    pub velocity_damping_base: f32,
    /// Frames an emotion is held before it may change.
    pub emotion_stability_range: RangeInclusive<u32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detection_interval: 30,
            max_match_distance: 150.0,
            persistence_frames: 90,
            report_window: 30,
            velocity_damping_base: 0.8,
            emotion_stability_range: 60..=180,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.detection_interval == 0 {
            return Err(Error::InvalidConfig(
                "detection_interval must be at least 1".into(),
            ));
        }

        if !self.max_match_distance.is_finite() || self.max_match_distance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_match_distance must be positive, got {}",
                self.max_match_distance
            )));
        }

        if !(self.velocity_damping_base > 0.0 && self.velocity_damping_base <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "velocity_damping_base must be in (0, 1], got {}",
                self.velocity_damping_base
            )));
        }

        if self.emotion_stability_range.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "emotion_stability_range {:?} is empty",
                self.emotion_stability_range
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn is_detection_frame(&self, frame_index: u64) -> bool {
        frame_index % self.detection_interval.max(1) == 0
    }
}

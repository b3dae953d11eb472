//! Per-face attribute snapshot and the collaborator that produces it.
//!
//! The snapshot is taken exactly once, when a track is created. Every field
//! carries an explicit `Unknown` variant so an estimator that cannot answer
//! degrades the snapshot instead of blocking track creation.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_derive::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::rng::RandomSource;

macro_rules! labels {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
            Unknown,
        }

        impl $name {
            /// Every known label, `Unknown` excluded.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unknown => "Unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labels!(AgeBucket {
    Teen => "16-22",
    YoungAdult => "23-30",
    Thirties => "31-40",
    Forties => "41-50",
    Fifties => "51-60",
    Senior => "60+",
});

labels!(Gender {
    Male => "Male",
    Female => "Female",
});

labels!(Ethnicity {
    European => "European",
    Asian => "Asian",
    African => "African",
    Hispanic => "Hispanic",
    MiddleEastern => "Middle Eastern",
    Mixed => "Mixed",
});

labels!(Emotion {
    Happy => "Happy",
    Neutral => "Neutral",
    Sad => "Sad",
    Surprised => "Surprised",
    Angry => "Angry",
    Fear => "Fear",
    Disgust => "Disgust",
});

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub age_bucket: AgeBucket,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub emotion_baseline: Emotion,
}

impl Attributes {
    /// Sentinel snapshot used when the estimator cannot answer.
    pub const fn unavailable() -> Self {
        Self {
            age_bucket: AgeBucket::Unknown,
            gender: Gender::Unknown,
            ethnicity: Ethnicity::Unknown,
            emotion_baseline: Emotion::Unknown,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::unavailable()
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Assigns the initial attribute snapshot of a newly seen face.
///
/// Called once per created track with the frame index and the detection box.
/// Implementations bound their own latency; an `Err` makes the tracker fall
/// back to [`Attributes::unavailable`].
pub trait AttributeEstimator {
    fn estimate(&mut self, frame_index: u64, bbox: &BoundingBox) -> Result<Attributes>;
}

impl<F> AttributeEstimator for F
where
    F: FnMut(u64, &BoundingBox) -> Result<Attributes>,
{
    #[inline]
    fn estimate(&mut self, frame_index: u64, bbox: &BoundingBox) -> Result<Attributes> {
        self(frame_index, bbox)
    }
}

/// Estimator with no model behind it. Every track gets the sentinel snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl AttributeEstimator for Unavailable {
    fn estimate(&mut self, _frame_index: u64, _bbox: &BoundingBox) -> Result<Attributes> {
        Err(Error::EstimatorUnavailable("no attribute model loaded".into()))
    }
}

const AGE_WEIGHTS: [f32; 6] = [0.15, 0.25, 0.30, 0.20, 0.08, 0.02];
const EMOTION_WEIGHTS: [f32; 7] = [2.0, 5.0, 1.0, 1.0, 0.5, 0.3, 0.2];
const UPPER_EMOTION_WEIGHTS: [f32; 2] = [4.0, 6.0];
const ETHNICITY_WEIGHTS: [f32; 6] = [0.20, 0.25, 0.15, 0.15, 0.15, 0.10];

/// Faces whose top edge is above this row lean Happy/Neutral.
const UPPER_REGION_Y: f32 = 200.0;
/// Faces larger than this (px²) are unlikely to be in the youngest bucket.
const CLOSE_FACE_AREA: f32 = 8000.0;

/// Plausible attribute snapshot without an image model: population-weighted
/// draws, a gender bit derived from the coarse box position, and a couple of
/// position/size heuristics.
#[derive(Debug, Clone)]
pub struct SimulatedEstimator<R> {
    rng: R,
}

impl<R: RandomSource> SimulatedEstimator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn signature_hash(bbox: &BoundingBox) -> u64 {
        // coarse so that small jitter maps to the same signature
        let signature = (
            (bbox.x / 20.0) as i64,
            (bbox.y / 20.0) as i64,
            (bbox.width / 10.0) as i64,
            (bbox.height / 10.0) as i64,
        );

        let mut hasher = DefaultHasher::new();
        signature.hash(&mut hasher);
        hasher.finish() % 10_000
    }
}

impl<R: RandomSource> AttributeEstimator for SimulatedEstimator<R> {
    fn estimate(&mut self, _frame_index: u64, bbox: &BoundingBox) -> Result<Attributes> {
        let hash = Self::signature_hash(bbox);

        let mut age = self.rng.weighted(&AGE_WEIGHTS);
        let gender = Gender::ALL[((hash + bbox.x.max(0.0) as u64) % 2) as usize];

        let baseline = self.rng.weighted(&EMOTION_WEIGHTS);
        let emotion = if bbox.y < UPPER_REGION_Y {
            Emotion::ALL[self.rng.weighted(&UPPER_EMOTION_WEIGHTS)]
        } else {
            Emotion::ALL[baseline]
        };

        let ethnicity = Ethnicity::ALL[self.rng.weighted(&ETHNICITY_WEIGHTS)];

        if bbox.area() > CLOSE_FACE_AREA && age == 0 {
            age = (age + self.rng.int_in(0..=1) as usize).min(AgeBucket::ALL.len() - 1);
        }

        Ok(Attributes {
            age_bucket: AgeBucket::ALL[age],
            gender,
            ethnicity,
            emotion_baseline: emotion,
        })
    }
}

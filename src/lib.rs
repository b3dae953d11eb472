pub mod attributes;
pub mod bbox;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod frame;
pub mod math;
pub mod pipeline;
pub mod rng;
pub mod store;
pub mod streams;
pub mod track;

mod history;
mod motion;

pub use attributes::{AgeBucket, AttributeEstimator, Attributes, Emotion, Ethnicity, Gender};
pub use bbox::BoundingBox;
pub use config::TrackerConfig;
pub use engine::FaceTracker;
pub use error::{Error, Result};
pub use frame::FrameReport;
pub use pipeline::{Detector, Session};
pub use rng::{RandomSource, RngSource};
pub use store::TrackId;
pub use streams::StreamTracker;
pub use track::ResolvedTrack;

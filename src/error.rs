use thiserror::Error;

use crate::bbox::BoundingBox;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("detection #{index} {bbox:?} rejected: {reason}")]
    InvalidBBox {
        index: usize,
        bbox: BoundingBox,
        reason: &'static str,
    },

    #[error("frame index {got} does not follow {last}")]
    NonMonotonicFrame { last: u64, got: u64 },

    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),

    #[error("attribute estimator unavailable: {0}")]
    EstimatorUnavailable(String),

    #[error("detector failed: {0}")]
    Detector(String),
}

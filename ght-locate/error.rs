use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Match {match_idx} references keypoint {index} but the {set} set has {len}")]
    IndexOutOfRange {
        match_idx: usize,
        set: &'static str,
        index: usize,
        len: usize,
    },
    #[error("No correspondences to localize from")]
    NoMatches,
    #[error("No vote landed inside the scene grid")]
    NoVotes,
    #[error("Insufficient correspondences: need {needed}, got {got}")]
    InsufficientCorrespondences { needed: usize, got: usize },
    #[error("Ill-conditioned geometry: {0}")]
    DegenerateGeometry(String),
    #[error("Insufficient inliers: need {needed}, found {found} of {total}")]
    InsufficientInliers {
        needed: usize,
        found: usize,
        total: usize,
    },
}

pub type LocateResult<T> = Result<T, LocateError>;

//! Descriptor correspondence search.
//!
//! [`BruteForceMatcher`] answers k-nearest-neighbour queries between two
//! descriptor sets; [`CorrespondenceFilter`] applies either the ratio test or
//! the cross-check on top of it to keep only unambiguous template→scene pairs.

use ght_core::Norm;
use thiserror::Error;

pub mod filter;
pub mod knn;

pub use filter::CorrespondenceFilter;
pub use knn::BruteForceMatcher;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Norm {0:?} is not defined for real-valued descriptors")]
    UnsupportedNorm(Norm),
    #[error("Descriptor dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Invalid neighbour count k = {0} (must be >= 1)")]
    InvalidK(usize),
    #[error("Invalid ratio threshold {0} (must be in (0, 1])")]
    InvalidRatio(f32),
}

pub type MatchResult<T> = Result<T, MatchError>;

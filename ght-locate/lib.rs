//! Template localization from filtered keypoint correspondences.
//!
//! Two independent back ends share one configuration:
//! - [`vote`] and [`peak`]: generalized Hough voting for the template center
//!   on a discretized scene grid.
//! - [`homography`] and [`ransac`]: a robust projective fit that maps the
//!   template corners onto a scene quadrilateral.
//!
//! [`Localizer`] runs both; [`LocalizerBuilder`] and [`LocalizerConfig`]
//! configure it.

use ght_core::Match;

pub mod builder;
pub mod config;
pub mod error;
pub mod homography;
pub mod localizer;
pub mod peak;
pub mod ransac;
pub mod types;
pub mod vote;

pub use builder::LocalizerBuilder;
pub use config::LocalizerConfig;
pub use error::{LocateError, LocateResult};
pub use homography::Homography;
pub use localizer::Localizer;
pub use peak::{select_peak, Peak};
pub use ransac::{fit_homography_ransac, RansacFit, RansacParams};
pub use types::{Outline, Quad, VoteStats};
pub use vote::{VoteAccumulator, VoteGrid};

/// Every match must reference an existing template and scene keypoint
pub(crate) fn check_indices(matches: &[Match], template_len: usize, scene_len: usize) -> LocateResult<()> {
    for (match_idx, m) in matches.iter().enumerate() {
        if m.query_idx >= template_len {
            return Err(LocateError::IndexOutOfRange {
                match_idx,
                set: "template",
                index: m.query_idx,
                len: template_len,
            });
        }
        if m.train_idx >= scene_len {
            return Err(LocateError::IndexOutOfRange {
                match_idx,
                set: "scene",
                index: m.train_idx,
                len: scene_len,
            });
        }
    }
    Ok(())
}

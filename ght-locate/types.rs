use ght_core::Point2;

use crate::homography::Homography;

/// Vote count summary of one accumulation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteStats {
    /// Votes that landed in the grid
    pub cast: usize,
    /// Predictions outside the grid or from unusable keypoints
    pub dropped: usize,
}

/// Four scene-space points, images of the template corners in winding order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad(pub [Point2; 4]);

impl Quad {
    pub fn corners(&self) -> &[Point2; 4] {
        &self.0
    }

    /// Consecutive corner pairs, closing from the 4th back to the 1st
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        (0..4).map(move |i| (self.0[i], self.0[(i + 1) % 4]))
    }

    /// Signed shoelace area; positive for the template's own winding
    pub fn signed_area(&self) -> f32 {
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f32>()
            / 2.0
    }

    /// Whether the outline is a simple convex quadrilateral with the template's winding
    pub fn is_convex(&self) -> bool {
        let p = &self.0;
        (0..4).all(|i| {
            let (a, b, c) = (p[i], p[(i + 1) % 4], p[(i + 2) % 4]);
            (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x) > 0.0
        })
    }
}

/// Successful projective localization
#[derive(Debug, Clone)]
pub struct Outline {
    pub homography: Homography,
    pub quad: Quad,
    /// Indices into the match list consistent with `homography`
    pub inliers: Vec<usize>,
}

impl Outline {
    pub fn inlier_ratio(&self, total: usize) -> f32 {
        if total == 0 {
            0.0
        } else {
            self.inliers.len() as f32 / total as f32
        }
    }
}

use ght_core::{ImageSize, Point2};
use serde::Serialize;

use crate::Detection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterReport {
    /// Origin of the winning vote cell
    pub position: Point2,
    pub cell_center: Point2,
    pub row: usize,
    pub col: usize,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineReport {
    /// Template corners (0,0), (W,0), (W,H), (0,H) mapped into the scene
    pub quad: [Point2; 4],
    /// Row-major, normalized so the last entry is 1
    pub homography: [[f64; 3]; 3],
    pub inliers: usize,
    pub inlier_ratio: f32,
    pub convex: bool,
}

/// Serializable result of one localization, each stage either a value or the reason it failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub template: ImageSize,
    pub scene: ImageSize,
    pub matches: usize,
    pub center: StageReport<CenterReport>,
    pub outline: StageReport<OutlineReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageReport<T> {
    Found(T),
    Failed(String),
}

impl<T> StageReport<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            StageReport::Found(t) => Some(t),
            StageReport::Failed(_) => None,
        }
    }
}

impl DetectionReport {
    pub fn new(detection: &Detection, template: ImageSize, scene: ImageSize) -> Self {
        let center = match &detection.center {
            Ok(peak) => StageReport::Found(CenterReport {
                position: peak.position,
                cell_center: peak.cell_center(),
                row: peak.row,
                col: peak.col,
                votes: peak.votes,
            }),
            Err(e) => StageReport::Failed(e.to_string()),
        };

        let outline = match &detection.outline {
            Ok(outline) => {
                let m = outline.homography.matrix();
                StageReport::Found(OutlineReport {
                    quad: *outline.quad.corners(),
                    homography: [
                        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
                    ],
                    inliers: outline.inliers.len(),
                    inlier_ratio: outline.inlier_ratio(detection.matches.len()),
                    convex: outline.quad.is_convex(),
                })
            }
            Err(e) => StageReport::Failed(e.to_string()),
        };

        Self {
            template,
            scene,
            matches: detection.matches.len(),
            center,
            outline,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

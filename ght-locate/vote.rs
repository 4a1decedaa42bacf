use std::f32::consts::TAU;

use ght_core::{BinSize, ImageSize, Keypoint, Match, Point2};
use rayon::prelude::*;

use crate::error::{LocateError, LocateResult};
use crate::types::VoteStats;

/// Angle of the vector `(dx, dy)` mapped onto [0, 2π).
///
/// `atan2` covers every quadrant including the axes; its (-π, 0) half is
/// shifted by a full turn. `(0, 0)` maps to 0.
pub fn polar_angle(dx: f32, dy: f32) -> f32 {
    let a = dy.atan2(dx);
    if a < 0.0 {
        // tiny negatives round up to TAU itself
        let wrapped = a + TAU;
        if wrapped >= TAU { 0.0 } else { wrapped }
    } else {
        a
    }
}

/// Scene-space object center implied by one correspondence.
///
/// The template keypoint's offset to `center` is rotated by the orientation
/// change and stretched by the scale change of the match, then applied to the
/// scene keypoint. Returns `None` when the template keypoint has no usable size.
pub fn predict_center(template_kp: &Keypoint, scene_kp: &Keypoint, center: Point2) -> Option<Point2> {
    if !(template_kp.size > 0.0) || !scene_kp.size.is_finite() {
        return None;
    }

    let dx = center.x - template_kp.x;
    let dy = center.y - template_kp.y;
    let r = dx.hypot(dy);
    let theta = polar_angle(dx, dy);

    let delta_a = match (scene_kp.orientation(), template_kp.orientation()) {
        (Some(s), Some(t)) => (s - t).to_radians(),
        _ => 0.0,
    };
    let delta_s = scene_kp.size / template_kp.size;

    let (sin, cos) = (theta + delta_a).sin_cos();
    let scene_r = delta_s * r;
    Some(Point2::new(scene_kp.x + scene_r * cos, scene_kp.y + scene_r * sin))
}

/// Discretized vote counts over the scene, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct VoteGrid {
    rows: usize,
    cols: usize,
    bin_w: usize,
    bin_h: usize,
    counts: Vec<u32>,
}

impl VoteGrid {
    /// Empty grid covering `scene` with `bin_size` cells
    pub fn new(scene: ImageSize, bin_size: BinSize) -> LocateResult<Self> {
        if scene.is_empty() {
            return Err(LocateError::InvalidImageSize {
                width: scene.width,
                height: scene.height,
            });
        }
        if !bin_size.is_valid() {
            return Err(LocateError::InvalidConfig(format!("bin size {bin_size:?} must be positive")));
        }

        let (bin_w, bin_h) = bin_size.resolve(scene);
        let rows = scene.height.div_ceil(bin_h);
        let cols = scene.width.div_ceil(bin_w);
        Ok(Self {
            rows,
            cols,
            bin_w,
            bin_h,
            counts: vec![0; rows * cols],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell width and height in pixels
    pub fn bin_size(&self) -> (usize, usize) {
        (self.bin_w, self.bin_h)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        (row < self.rows && col < self.cols).then(|| self.counts[row * self.cols + col])
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Cell containing `p`, or `None` outside the grid
    pub fn cell_of(&self, p: Point2) -> Option<(usize, usize)> {
        if !p.x.is_finite() || !p.y.is_finite() || p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let col = (p.x / self.bin_w as f32).floor() as usize;
        let row = (p.y / self.bin_h as f32).floor() as usize;
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Adds one vote at `p`; out-of-grid positions are dropped, not clamped
    pub fn vote(&mut self, p: Point2) -> bool {
        match self.cell_of(p) {
            Some((row, col)) => {
                self.counts[row * self.cols + col] += 1;
                true
            }
            None => false,
        }
    }
}

/// Generalized Hough voting for the template center
#[derive(Debug, Clone, Copy)]
pub struct VoteAccumulator {
    bin_size: BinSize,
}

impl VoteAccumulator {
    pub fn new(bin_size: BinSize) -> Self {
        Self { bin_size }
    }

    /// One vote per match for the scene position of the template's geometric center
    pub fn accumulate(
        &self,
        matches: &[Match],
        template_kps: &[Keypoint],
        scene_kps: &[Keypoint],
        template_size: ImageSize,
        scene_size: ImageSize,
    ) -> LocateResult<(VoteGrid, VoteStats)> {
        if template_size.is_empty() {
            return Err(LocateError::InvalidImageSize {
                width: template_size.width,
                height: template_size.height,
            });
        }
        crate::check_indices(matches, template_kps.len(), scene_kps.len())?;

        let mut grid = VoteGrid::new(scene_size, self.bin_size)?;
        let center = template_size.center();

        let predictions: Vec<Option<Point2>> = matches
            .par_iter()
            .map(|m| predict_center(&template_kps[m.query_idx], &scene_kps[m.train_idx], center))
            .collect();

        let mut stats = VoteStats::default();
        for p in predictions {
            if p.is_some_and(|p| grid.vote(p)) {
                stats.cast += 1;
            } else {
                stats.dropped += 1;
            }
        }

        log::debug!(
            "voting on {}x{} grid: {} cast, {} dropped",
            grid.rows,
            grid.cols,
            stats.cast,
            stats.dropped
        );
        Ok((grid, stats))
    }
}

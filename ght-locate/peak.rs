use ght_core::Point2;

use crate::error::{LocateError, LocateResult};
use crate::vote::VoteGrid;

/// Strongest accumulator cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub votes: u32,
    /// Scene position of the cell: column/row index times bin size
    pub position: Point2,
    bin_w: usize,
    bin_h: usize,
}

impl Peak {
    /// Midpoint of the winning cell
    pub fn cell_center(&self) -> Point2 {
        Point2::new(
            self.position.x + self.bin_w as f32 / 2.0,
            self.position.y + self.bin_h as f32 / 2.0,
        )
    }
}

/// Returns the cell with the strictly largest count, the first one in row-major order on ties
pub fn select_peak(grid: &VoteGrid) -> LocateResult<Peak> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &c) in grid.counts().iter().enumerate() {
        if c > best.map_or(0, |(_, v)| v) {
            best = Some((i, c));
        }
    }

    let (idx, votes) = best.ok_or(LocateError::NoVotes)?;
    let (bin_w, bin_h) = grid.bin_size();
    let (row, col) = (idx / grid.cols(), idx % grid.cols());
    Ok(Peak {
        row,
        col,
        votes,
        position: Point2::new((col * bin_w) as f32, (row * bin_h) as f32),
        bin_w,
        bin_h,
    })
}

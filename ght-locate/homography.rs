//! Plane-to-plane homography estimation.
//!
//! Direct Linear Transform over ≥4 correspondences with Hartley
//! normalization, plus the projection helpers used to map template corners.

use ght_core::Point2;
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

use crate::error::{LocateError, LocateResult};

const EPS: f64 = 1e-12;

/// Minimum number of correspondences that determine a homography
pub const MIN_CORRESPONDENCES: usize = 4;

/// 3x3 projective transform from template plane to scene plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Maps `(x, y, 1)` and dehomogenizes; `None` for points sent to infinity
    pub fn project(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let v = self.0 * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        Some([v[0] / w, v[1] / w])
    }

    pub fn project_point(&self, p: Point2) -> Option<Point2> {
        self.project([p.x as f64, p.y as f64])
            .map(|[x, y]| Point2::new(x as f32, y as f32))
    }

    /// Distance between the projection of `src` and `dst`; infinite if `src` has no image
    pub fn reprojection_error(&self, src: [f64; 2], dst: [f64; 2]) -> f64 {
        match self.project(src) {
            Some(p) => (p[0] - dst[0]).hypot(p[1] - dst[1]),
            None => f64::INFINITY,
        }
    }

    pub fn try_inverse(&self) -> Option<Homography> {
        self.0.try_inverse().map(|m| Homography(normalized(m)))
    }

    /// Rejects singular and non-finite matrices
    pub fn is_well_conditioned(&self) -> bool {
        self.0.iter().all(|v| v.is_finite()) && self.0.determinant().abs() > EPS
    }
}

fn normalized(m: Matrix3<f64>) -> Matrix3<f64> {
    let s = m[(2, 2)];
    if s.abs() < EPS {
        m
    } else {
        m / s
    }
}

/// Translates the centroid to the origin and scales the mean distance to √2
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / n;
    let s = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

/// Least-squares homography with `dst ≈ H · src`
pub fn estimate_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> LocateResult<Homography> {
    let n = src.len().min(dst.len());
    if n < MIN_CORRESPONDENCES {
        return Err(LocateError::InsufficientCorrespondences {
            needed: MIN_CORRESPONDENCES,
            got: n,
        });
    }
    if src.len() != dst.len() {
        return Err(LocateError::InvalidConfig(format!(
            "point set sizes differ: {} vs {}",
            src.len(),
            dst.len()
        )));
    }

    if all_collinear(src) || all_collinear(dst) {
        return Err(LocateError::DegenerateGeometry("all points are collinear".into()));
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A is the eigenvector of AᵀA with the smallest eigenvalue
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.abs().total_cmp(&y.abs()))
        .ok_or_else(|| LocateError::DegenerateGeometry("empty eigen decomposition".into()))?;
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| LocateError::DegenerateGeometry("normalizing transform not invertible".into()))?;
    let homography = Homography(normalized(t_dst_inv * h_norm * t_src));

    if !homography.is_well_conditioned() {
        return Err(LocateError::DegenerateGeometry("singular homography".into()));
    }
    Ok(homography)
}

/// True if `a`, `b`, `c` span (almost) no area relative to their extent
pub fn collinear(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
    let scale = [(a, b), (b, c), (c, a)]
        .iter()
        .map(|(p, q)| (p[0] - q[0]).hypot(p[1] - q[1]))
        .fold(0.0f64, f64::max);
    cross.abs() <= 1e-6 * scale * scale.max(1.0)
}

/// True if no three points of `pts` span a triangle
pub fn all_collinear(pts: &[[f64; 2]]) -> bool {
    let Some(&a) = pts.first() else {
        return true;
    };
    // Farthest point from `a` fixes the line direction
    let Some(&b) = pts
        .iter()
        .max_by(|p, q| (p[0] - a[0]).hypot(p[1] - a[1]).total_cmp(&(q[0] - a[0]).hypot(q[1] - a[1])))
    else {
        return true;
    };
    pts.iter().all(|&c| collinear(a, b, c))
}

/// Whether any three of the four points are collinear
pub fn degenerate_sample(pts: &[[f64; 2]; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES
        .iter()
        .any(|&(i, j, k)| collinear(pts[i], pts[j], pts[k]))
}

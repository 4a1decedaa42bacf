use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::error::{LocateError, LocateResult};
use crate::homography::{degenerate_sample, estimate_dlt, Homography, MIN_CORRESPONDENCES};

/// Parameters of the robust homography fit
#[derive(Debug, Clone, PartialEq)]
pub struct RansacParams {
    /// Reprojection error (pixels) below which a pair counts as an inlier
    pub reproj_threshold: f64,
    /// Upper bound on sampled hypotheses
    pub max_iterations: usize,
    /// Desired probability that one sample was outlier-free
    pub confidence: f64,
    /// Fraction of pairs that must agree with the final model
    pub min_inlier_ratio: f64,
    /// Refit on all inliers after sampling
    pub refine: bool,
    /// Fixed seed for reproducible sampling, entropy otherwise
    pub seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            reproj_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            min_inlier_ratio: 0.0,
            refine: true,
            seed: Some(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RansacFit {
    pub homography: Homography,
    /// Indices of pairs within the reprojection threshold
    pub inliers: Vec<usize>,
    pub iterations: usize,
}

/// Iterations needed to draw one all-inlier minimal sample with `confidence`
fn required_iterations(inlier_ratio: f64, confidence: f64, cap: usize) -> usize {
    let p_good = inlier_ratio.powi(MIN_CORRESPONDENCES as i32);
    if p_good <= 0.0 {
        return cap;
    }
    if p_good >= 1.0 {
        return 1;
    }
    let k = (1.0 - confidence).ln() / (1.0 - p_good).ln();
    if k.is_finite() {
        (k.ceil() as usize).clamp(1, cap)
    } else {
        cap
    }
}

fn inliers_of(h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> Vec<usize> {
    src.iter()
        .zip(dst)
        .enumerate()
        .filter(|(_, (s, d))| h.reprojection_error(**s, **d) < threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Fit `dst ≈ H · src` tolerating outlier pairs
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &RansacParams,
) -> LocateResult<RansacFit> {
    let n = src.len().min(dst.len());
    if n < MIN_CORRESPONDENCES {
        return Err(LocateError::InsufficientCorrespondences {
            needed: MIN_CORRESPONDENCES,
            got: n,
        });
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut best: Option<(Homography, Vec<usize>)> = None;
    let mut budget = params.max_iterations.max(1);
    let mut iterations = 0;
    let mut degenerate = 0;

    while iterations < budget {
        iterations += 1;

        let sample = index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        let mut s4 = [[0.0; 2]; 4];
        let mut d4 = [[0.0; 2]; 4];
        for (slot, i) in sample.iter().enumerate() {
            s4[slot] = src[i];
            d4[slot] = dst[i];
        }
        if degenerate_sample(&s4) || degenerate_sample(&d4) {
            degenerate += 1;
            continue;
        }

        let Ok(h) = estimate_dlt(&s4, &d4) else {
            degenerate += 1;
            continue;
        };

        let inliers = inliers_of(&h, src, dst, params.reproj_threshold);
        if best.as_ref().map_or(true, |(_, b)| inliers.len() > b.len()) {
            let ratio = inliers.len() as f64 / n as f64;
            budget = budget.min(required_iterations(ratio, params.confidence, params.max_iterations));
            best = Some((h, inliers));
        }
    }

    let Some((mut homography, mut inliers)) = best else {
        log::warn!("all {iterations} minimal samples were degenerate");
        return Err(LocateError::DegenerateGeometry(format!(
            "all {degenerate} sampled subsets are collinear or singular"
        )));
    };

    if params.refine && inliers.len() > MIN_CORRESPONDENCES {
        let (s_in, d_in): (Vec<[f64; 2]>, Vec<[f64; 2]>) =
            inliers.iter().map(|&i| (src[i], dst[i])).unzip();
        if let Ok(refined) = estimate_dlt(&s_in, &d_in) {
            let refined_inliers = inliers_of(&refined, src, dst, params.reproj_threshold);
            if refined_inliers.len() >= inliers.len() {
                homography = refined;
                inliers = refined_inliers;
            }
        }
    }

    let needed = (params.min_inlier_ratio * n as f64).ceil() as usize;
    if inliers.len() < needed.max(MIN_CORRESPONDENCES) {
        return Err(LocateError::InsufficientInliers {
            needed: needed.max(MIN_CORRESPONDENCES),
            found: inliers.len(),
            total: n,
        });
    }

    log::debug!(
        "ransac: {} inliers of {} after {} iterations ({} degenerate samples)",
        inliers.len(),
        n,
        iterations,
        degenerate
    );
    Ok(RansacFit {
        homography,
        inliers,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use proptest::prelude::*;
    use rand::Rng;

    fn similarity(angle: f64, scale: f64, tx: f64, ty: f64) -> Homography {
        let (s, c) = angle.sin_cos();
        Homography(Matrix3::new(
            scale * c, -scale * s, tx,
            scale * s, scale * c, ty,
            0.0, 0.0, 1.0,
        ))
    }

    fn grid_points(n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| [(i % 4) as f64 * 23.0 + 2.0, (i / 4) as f64 * 9.0 + 5.0])
            .collect()
    }

    #[test]
    fn test_required_iterations() {
        assert_eq!(required_iterations(1.0, 0.99, 500), 1);
        assert_eq!(required_iterations(0.0, 0.99, 500), 500);
        let k = required_iterations(0.5, 0.99, 10_000);
        assert!((70..=73).contains(&k), "k = {k}");
    }

    #[test]
    fn test_ransac_rejects_outliers() {
        let h_true = similarity(0.3, 1.5, 120.0, 40.0);
        let mut rng = StdRng::seed_from_u64(7);

        let mut src = grid_points(30);
        let mut dst: Vec<[f64; 2]> = src
            .iter()
            .map(|&s| {
                let d = h_true.project(s).unwrap();
                [d[0] + rng.random_range(-0.3..0.3), d[1] + rng.random_range(-0.3..0.3)]
            })
            .collect();
        for _ in 0..12 {
            src.push([rng.random_range(0.0..100.0), rng.random_range(0.0..80.0)]);
            dst.push([rng.random_range(0.0..640.0), rng.random_range(0.0..480.0)]);
        }

        let fit = fit_homography_ransac(&src, &dst, &RansacParams::default()).unwrap();
        assert!(fit.inliers.len() >= 30);
        assert!((0..30).all(|i| fit.inliers.contains(&i)));
        for corner in [[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]] {
            let expected = h_true.project(corner).unwrap();
            let got = fit.homography.project(corner).unwrap();
            assert!((expected[0] - got[0]).hypot(expected[1] - got[1]) < 1.5);
        }
    }

    #[test]
    fn test_too_few_pairs() {
        let pts = grid_points(3);
        assert!(matches!(
            fit_homography_ransac(&pts, &pts, &RansacParams::default()),
            Err(LocateError::InsufficientCorrespondences { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn test_collinear_pairs_are_degenerate() {
        let src: Vec<[f64; 2]> = (0..10).map(|i| [i as f64 * 5.0, i as f64 * 2.0]).collect();
        let params = RansacParams {
            max_iterations: 50,
            ..RansacParams::default()
        };
        assert!(matches!(
            fit_homography_ransac(&src, &src, &params),
            Err(LocateError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_min_inlier_ratio_enforced() {
        let h_true = similarity(0.0, 1.0, 10.0, 10.0);
        let mut src = grid_points(6);
        let mut dst: Vec<[f64; 2]> = src.iter().map(|&s| h_true.project(s).unwrap()).collect();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..14 {
            src.push([rng.random_range(0.0..100.0), rng.random_range(0.0..80.0)]);
            dst.push([rng.random_range(200.0..640.0), rng.random_range(200.0..480.0)]);
        }

        let params = RansacParams {
            min_inlier_ratio: 0.5,
            ..RansacParams::default()
        };
        assert!(matches!(
            fit_homography_ransac(&src, &dst, &params),
            Err(LocateError::InsufficientInliers { needed: 10, .. })
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let h_true = similarity(-0.2, 0.8, 30.0, 60.0);
        let src = grid_points(20);
        let dst: Vec<[f64; 2]> = src.iter().map(|&s| h_true.project(s).unwrap()).collect();
        let params = RansacParams {
            seed: Some(99),
            ..RansacParams::default()
        };

        let a = fit_homography_ransac(&src, &dst, &params).unwrap();
        let b = fit_homography_ransac(&src, &dst, &params).unwrap();
        assert_eq!(a.homography, b.homography);
        assert_eq!(a.inliers, b.inliers);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_noiseless_corners_round_trip(
            angle in -3.0f64..3.0,
            scale in 0.3f64..3.0,
            tx in -200.0f64..200.0,
            ty in -200.0f64..200.0,
        ) {
            let h_true = similarity(angle, scale, tx, ty);
            let src = grid_points(18);
            let dst: Vec<[f64; 2]> = src.iter().map(|&s| h_true.project(s).unwrap()).collect();

            let fit = fit_homography_ransac(&src, &dst, &RansacParams::default()).unwrap();
            let inv = fit.homography.try_inverse().unwrap();
            for corner in [[0.0, 0.0], [90.0, 0.0], [90.0, 40.0], [0.0, 40.0]] {
                let back = inv.project(fit.homography.project(corner).unwrap()).unwrap();
                prop_assert!((back[0] - corner[0]).abs() < 1e-3);
                prop_assert!((back[1] - corner[1]).abs() < 1e-3);
                let expected = h_true.project(corner).unwrap();
                let got = fit.homography.project(corner).unwrap();
                prop_assert!((expected[0] - got[0]).hypot(expected[1] - got[1]) < 1e-3);
            }
        }
    }
}

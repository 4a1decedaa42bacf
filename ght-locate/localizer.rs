use ght_core::{ImageSize, Keypoint, Match, Point2};

use crate::builder::LocalizerBuilder;
use crate::config::LocalizerConfig;
use crate::error::{LocateError, LocateResult};
use crate::peak::{select_peak, Peak};
use crate::ransac::fit_homography_ransac;
use crate::types::{Outline, Quad, VoteStats};
use crate::vote::{VoteAccumulator, VoteGrid};

/// Both localization back ends behind one validated configuration.
///
/// Center voting and the projective outline are independent: either may fail
/// while the other succeeds, so they are exposed as separate calls.
#[derive(Debug, Clone)]
pub struct Localizer {
    config: LocalizerConfig,
    accumulator: VoteAccumulator,
}

impl Localizer {
    /// Validates `config` and prepares the accumulator
    pub fn new(config: LocalizerConfig) -> LocateResult<Self> {
        config.validate()?;
        let accumulator = VoteAccumulator::new(config.bin_size);
        Ok(Self { config, accumulator })
    }

    pub fn builder() -> LocalizerBuilder {
        LocalizerBuilder::new()
    }

    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    /// Get a summary of the localizer's configuration.
    pub fn config_summary(&self) -> String {
        self.config.summary()
    }

    /// Vote grid for the template center, with per-vote bookkeeping.
    ///
    /// # Errors
    /// `NoMatches` for an empty match list, plus whatever
    /// [`VoteAccumulator::accumulate`] rejects.
    pub fn vote(
        &self,
        matches: &[Match],
        template_kps: &[Keypoint],
        scene_kps: &[Keypoint],
        template_size: ImageSize,
        scene_size: ImageSize,
    ) -> LocateResult<(VoteGrid, VoteStats)> {
        if matches.is_empty() {
            return Err(LocateError::NoMatches);
        }
        self.accumulator
            .accumulate(matches, template_kps, scene_kps, template_size, scene_size)
    }

    /// Most-voted scene position of the template center
    pub fn locate_center(
        &self,
        matches: &[Match],
        template_kps: &[Keypoint],
        scene_kps: &[Keypoint],
        template_size: ImageSize,
        scene_size: ImageSize,
    ) -> LocateResult<Peak> {
        let (grid, stats) = self.vote(matches, template_kps, scene_kps, template_size, scene_size)?;
        let peak = select_peak(&grid).inspect_err(|_| {
            log::warn!("all {} votes fell outside the scene", stats.dropped);
        })?;
        log::debug!(
            "center peak at cell ({}, {}) with {} of {} votes",
            peak.row,
            peak.col,
            peak.votes,
            stats.cast
        );
        Ok(peak)
    }

    /// Robust homography from the matched keypoint positions and the template
    /// outline it projects into the scene.
    pub fn outline(
        &self,
        matches: &[Match],
        template_kps: &[Keypoint],
        scene_kps: &[Keypoint],
        template_size: ImageSize,
    ) -> LocateResult<Outline> {
        if template_size.is_empty() {
            return Err(LocateError::InvalidImageSize {
                width: template_size.width,
                height: template_size.height,
            });
        }
        if matches.is_empty() {
            return Err(LocateError::NoMatches);
        }
        crate::check_indices(matches, template_kps.len(), scene_kps.len())?;

        let (src, dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = matches
            .iter()
            .map(|m| {
                let t = &template_kps[m.query_idx];
                let s = &scene_kps[m.train_idx];
                ([t.x as f64, t.y as f64], [s.x as f64, s.y as f64])
            })
            .unzip();

        let fit = fit_homography_ransac(&src, &dst, &self.config.ransac_params())?;

        let corners = template_size.corners();
        let mut projected = [Point2::default(); 4];
        for (slot, corner) in projected.iter_mut().zip(corners) {
            *slot = fit.homography.project_point(corner).ok_or_else(|| {
                LocateError::DegenerateGeometry(format!(
                    "template corner ({}, {}) maps to infinity",
                    corner.x, corner.y
                ))
            })?;
        }

        log::debug!(
            "outline from {} of {} matches after {} iterations",
            fit.inliers.len(),
            matches.len(),
            fit.iterations
        );
        Ok(Outline {
            homography: fit.homography,
            quad: Quad(projected),
            inliers: fit.inliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TEMPLATE: ImageSize = ImageSize { width: 205, height: 155 };
    const SCENE: ImageSize = ImageSize { width: 640, height: 480 };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn template_keypoints() -> Vec<Keypoint> {
        (0..24)
            .map(|i| {
                Keypoint::new(
                    10.0 + (i % 6) as f32 * 35.0 + (i * 7 % 5) as f32,
                    12.0 + (i / 6) as f32 * 32.0 + (i * 3 % 4) as f32,
                    8.0 + (i % 5) as f32 * 2.0,
                    (i * 37 % 360) as f32,
                )
            })
            .collect()
    }

    fn similarity(kps: &[Keypoint], angle_deg: f32, scale: f32, tx: f32, ty: f32) -> Vec<Keypoint> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        kps.iter()
            .map(|k| {
                Keypoint::new(
                    scale * (c * k.x - s * k.y) + tx,
                    scale * (s * k.x + c * k.y) + ty,
                    k.size * scale,
                    (k.angle + angle_deg).rem_euclid(360.0),
                )
            })
            .collect()
    }

    fn identity_matches(n: usize) -> Vec<Match> {
        (0..n).map(|i| Match::new(i, i, 0.0)).collect()
    }

    #[test]
    fn test_identical_images() {
        init_logging();
        let kps = template_keypoints();
        let matches = identity_matches(kps.len());
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        let peak = localizer
            .locate_center(&matches, &kps, &kps, TEMPLATE, TEMPLATE)
            .unwrap();
        let center = TEMPLATE.center();
        assert_eq!(peak.votes as usize, kps.len());
        assert!((peak.position.x - center.x).abs() <= 10.0);
        assert!((peak.position.y - center.y).abs() <= 10.0);

        let outline = localizer.outline(&matches, &kps, &kps, TEMPLATE).unwrap();
        for (a, b) in outline
            .homography
            .matrix()
            .iter()
            .zip(nalgebra::Matrix3::<f64>::identity().iter())
        {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
        for (got, want) in outline.quad.corners().iter().zip(TEMPLATE.corners()) {
            assert_abs_diff_eq!(got.x, want.x, epsilon = 1e-3);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 1e-3);
        }
        assert_eq!(outline.inliers.len(), kps.len());
    }

    #[test]
    fn test_rotated_and_scaled_scene() {
        let template = template_keypoints();
        let scene = similarity(&template, 30.0, 1.5, 300.0, 200.0);
        let matches = identity_matches(template.len());
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        let (grid, stats) = localizer
            .vote(&matches, &template, &scene, TEMPLATE, SCENE)
            .unwrap();
        assert_eq!(stats.cast, template.len());

        let center = TEMPLATE.center();
        let expected_center = similarity(
            &[Keypoint::new(center.x, center.y, 1.0, 0.0)],
            30.0,
            1.5,
            300.0,
            200.0,
        )[0]
        .pt();
        let peak = select_peak(&grid).unwrap();
        assert_eq!(grid.cell_of(expected_center), Some((peak.row, peak.col)));
        assert_eq!(peak.votes as usize, template.len());

        let outline = localizer.outline(&matches, &template, &scene, TEMPLATE).unwrap();
        let corner_kps: Vec<Keypoint> = TEMPLATE
            .corners()
            .iter()
            .map(|c| Keypoint::new(c.x, c.y, 1.0, 0.0))
            .collect();
        let expected = similarity(&corner_kps, 30.0, 1.5, 300.0, 200.0);
        for (got, want) in outline.quad.corners().iter().zip(&expected) {
            assert_abs_diff_eq!(got.x, want.x, epsilon = 0.05);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 0.05);
        }
        assert!(outline.quad.is_convex());
    }

    #[test]
    fn test_fewer_than_four_matches() {
        let kps = template_keypoints();
        let matches = identity_matches(3);
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        let peak = localizer.locate_center(&matches, &kps, &kps, TEMPLATE, TEMPLATE);
        assert_eq!(peak.map(|p| p.votes), Ok(3));

        assert_eq!(
            localizer.outline(&matches, &kps, &kps, TEMPLATE).map(|o| o.inliers),
            Err(LocateError::InsufficientCorrespondences { needed: 4, got: 3 })
        );
    }

    #[test]
    fn test_empty_matches() {
        let kps = template_keypoints();
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        assert_eq!(
            localizer.locate_center(&[], &kps, &kps, TEMPLATE, SCENE),
            Err(LocateError::NoMatches)
        );
        assert_eq!(
            localizer.outline(&[], &kps, &kps, TEMPLATE).map(|o| o.inliers),
            Err(LocateError::NoMatches)
        );
    }

    #[test]
    fn test_all_votes_outside_scene() {
        let template = template_keypoints();
        let scene = similarity(&template, 0.0, 1.0, 5000.0, 5000.0);
        let matches = identity_matches(template.len());
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        assert_eq!(
            localizer.locate_center(&matches, &template, &scene, TEMPLATE, SCENE),
            Err(LocateError::NoVotes)
        );
    }

    #[test]
    fn test_dangling_match_index() {
        let kps = template_keypoints();
        let mut matches = identity_matches(6);
        matches.push(Match::new(99, 0, 0.0));
        let localizer = Localizer::new(LocalizerConfig::default()).unwrap();

        assert!(matches!(
            localizer.outline(&matches, &kps, &kps, TEMPLATE),
            Err(LocateError::IndexOutOfRange { set: "template", index: 99, .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = LocalizerConfig {
            reproj_threshold: 0.0,
            ..LocalizerConfig::default()
        };
        assert!(matches!(Localizer::new(cfg), Err(LocateError::InvalidConfig(_))));
    }
}

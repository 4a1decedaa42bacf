//! High-level template localization.
//!
//! [`Ght`] chains correspondence filtering with the two localization back
//! ends: Hough voting for the template center and a robust homography for
//! its outline. Each back end reports success or failure on its own.

use ght_core::{Descriptor, ImageSize, Keypoint, Match, init_thread_pool};
use ght_locate::{LocateError, Localizer, LocalizerConfig, Outline, Peak};
use ght_match::{BruteForceMatcher, CorrespondenceFilter, MatchError};
use thiserror::Error;

pub mod features;
pub mod overlay;
pub mod report;

pub use features::{Descriptors, FeatureFile};
pub use ght_core::{self, Point2};
pub use ght_locate::{self, LocalizerBuilder};
pub use report::DetectionReport;

#[derive(Debug, Error)]
pub enum GhtError {
    #[error("Matching error: {0}")]
    Match(#[from] MatchError),
    #[error("Localization error: {0}")]
    Locate(#[from] LocateError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GhtResult<T> = Result<T, GhtError>;

/// Keypoints of one image with one descriptor per keypoint
#[derive(Debug, Clone, PartialEq)]
pub struct Features<D> {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<D>,
}

impl<D: Descriptor> Features<D> {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<D>) -> GhtResult<Self> {
        let features = Self { keypoints, descriptors };
        features.validate("features")?;
        Ok(features)
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    fn validate(&self, label: &str) -> GhtResult<()> {
        if self.keypoints.len() != self.descriptors.len() {
            return Err(GhtError::InvalidInput(format!(
                "{label}: {} keypoints but {} descriptors",
                self.keypoints.len(),
                self.descriptors.len()
            )));
        }
        Ok(())
    }
}

/// Outcome of one template/scene localization
#[derive(Debug, Clone)]
pub struct Detection {
    /// Filtered template→scene correspondences
    pub matches: Vec<Match>,
    pub center: Result<Peak, LocateError>,
    pub outline: Result<Outline, LocateError>,
}

impl Detection {
    /// Whether at least one back end produced a result
    pub fn found(&self) -> bool {
        self.center.is_ok() || self.outline.is_ok()
    }
}

/// Template localizer combining descriptor matching, center voting and homography fitting
pub struct Ght {
    filter: CorrespondenceFilter,
    localizer: Localizer,
}

impl Ght {
    /// Create a new localizer with the given configuration
    pub fn new(config: LocalizerConfig) -> GhtResult<Self> {
        // The global pool can only be built once per process
        if let Err(e) = init_thread_pool(config.core.n_threads) {
            log::debug!("keeping existing thread pool: {e}");
        }

        let filter = CorrespondenceFilter::from_config(&config.core)?;
        let localizer = Localizer::new(config)?;
        Ok(Self { filter, localizer })
    }

    /// Unambiguous template→scene correspondences
    pub fn match_features<D: Descriptor>(&self, template: &Features<D>, scene: &Features<D>) -> GhtResult<Vec<Match>> {
        template.validate("template")?;
        scene.validate("scene")?;

        let matcher = BruteForceMatcher::new(self.config().core.norm_for::<D>());
        let matches = self.filter.filter(&matcher, &template.descriptors, &scene.descriptors)?;
        log::debug!(
            "{} matches from {} template and {} scene features",
            matches.len(),
            template.len(),
            scene.len()
        );
        Ok(matches)
    }

    /// Match, then run center voting and outline fitting independently
    pub fn localize<D: Descriptor>(
        &self,
        template: &Features<D>,
        scene: &Features<D>,
        template_size: ImageSize,
        scene_size: ImageSize,
    ) -> GhtResult<Detection> {
        for (label, size) in [("template", template_size), ("scene", scene_size)] {
            if size.is_empty() {
                return Err(GhtError::InvalidInput(format!(
                    "{label} image is {}x{}",
                    size.width, size.height
                )));
            }
        }

        let matches = self.match_features(template, scene)?;
        let center = self.localizer.locate_center(
            &matches,
            &template.keypoints,
            &scene.keypoints,
            template_size,
            scene_size,
        );
        let outline = self
            .localizer
            .outline(&matches, &template.keypoints, &scene.keypoints, template_size);

        if let Err(e) = &center {
            log::info!("no center estimate: {e}");
        }
        if let Err(e) = &outline {
            log::info!("no outline: {e}");
        }
        Ok(Detection { matches, center, outline })
    }

    /// Localize from two loaded feature files; both must carry the same descriptor kind
    pub fn localize_files(
        &self,
        template: FeatureFile,
        scene: FeatureFile,
        template_size: ImageSize,
        scene_size: ImageSize,
    ) -> GhtResult<Detection> {
        match (template.descriptors, scene.descriptors) {
            (Descriptors::Binary(t), Descriptors::Binary(s)) => self.localize(
                &Features::new(template.keypoints, t)?,
                &Features::new(scene.keypoints, s)?,
                template_size,
                scene_size,
            ),
            (Descriptors::Float(t), Descriptors::Float(s)) => self.localize(
                &Features::new(template.keypoints, t)?,
                &Features::new(scene.keypoints, s)?,
                template_size,
                scene_size,
            ),
            _ => Err(GhtError::InvalidInput(
                "template and scene descriptors differ in kind (binary vs float)".into(),
            )),
        }
    }

    /// Get localizer configuration
    pub fn config(&self) -> &LocalizerConfig {
        self.localizer.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TEMPLATE: ImageSize = ImageSize::new(160, 120);
    const SCENE: ImageSize = ImageSize::new(400, 300);

    /// Distinct 32-byte descriptors: each differs from the others in many bits
    fn binary_descriptor(i: usize) -> Vec<u8> {
        (0..32)
            .map(|b| ((i * 131 + b * 29) as u8).wrapping_mul(157) ^ (i as u8).rotate_left(b as u32 % 8))
            .collect()
    }

    fn template_features() -> Features<Vec<u8>> {
        let keypoints: Vec<Keypoint> = (0..20)
            .map(|i| {
                Keypoint::new(
                    8.0 + (i % 5) as f32 * 33.0 + (i % 3) as f32,
                    9.0 + (i / 5) as f32 * 27.0 + (i % 2) as f32 * 2.0,
                    10.0,
                    (i * 23 % 360) as f32,
                )
            })
            .collect();
        let descriptors = (0..20).map(binary_descriptor).collect();
        Features::new(keypoints, descriptors).unwrap()
    }

    /// The template translated by (tx, ty) with its features listed in reverse
    fn translated_scene(template: &Features<Vec<u8>>, tx: f32, ty: f32) -> Features<Vec<u8>> {
        let keypoints = template
            .keypoints
            .iter()
            .rev()
            .map(|k| Keypoint::new(k.x + tx, k.y + ty, k.size, k.angle))
            .collect();
        let descriptors = template.descriptors.iter().rev().cloned().collect();
        Features::new(keypoints, descriptors).unwrap()
    }

    #[test]
    fn test_descriptor_count_mismatch() {
        let err = Features::new(vec![Keypoint::new(0.0, 0.0, 1.0, 0.0)], Vec::<Vec<u8>>::new());
        assert!(matches!(err, Err(GhtError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_image_size_rejected() {
        let ght = Ght::new(LocalizerConfig::default()).unwrap();
        let t = template_features();
        let result = ght.localize(&t, &t, ImageSize::new(0, 10), SCENE);
        assert!(matches!(result, Err(GhtError::InvalidInput(_))));
    }

    #[test]
    fn test_translated_template_is_found() {
        let ght = Ght::new(LocalizerConfig::default()).unwrap();
        let template = template_features();
        let scene = translated_scene(&template, 123.0, 87.0);

        let detection = ght.localize(&template, &scene, TEMPLATE, SCENE).unwrap();
        assert_eq!(detection.matches.len(), 20);
        for m in &detection.matches {
            assert_eq!(m.train_idx, 19 - m.query_idx);
        }

        // Center (80, 60) lands at (203, 147): cell column 20, row 14
        let peak = detection.center.as_ref().unwrap();
        assert_eq!((peak.row, peak.col), (14, 20));
        assert_eq!(peak.votes, 20);

        let outline = detection.outline.as_ref().unwrap();
        let expected = [(123.0, 87.0), (283.0, 87.0), (283.0, 207.0), (123.0, 207.0)];
        for (got, (x, y)) in outline.quad.corners().iter().zip(expected) {
            assert_abs_diff_eq!(got.x, x, epsilon = 0.01);
            assert_abs_diff_eq!(got.y, y, epsilon = 0.01);
        }
    }

    #[test]
    fn test_back_ends_fail_independently() {
        let ght = Ght::new(LocalizerConfig::default()).unwrap();
        let full = template_features();
        let template = Features::new(full.keypoints[..3].to_vec(), full.descriptors[..3].to_vec()).unwrap();
        let scene = translated_scene(&template, 50.0, 40.0);

        let detection = ght.localize(&template, &scene, TEMPLATE, SCENE).unwrap();
        assert_eq!(detection.matches.len(), 3);
        assert!(detection.center.is_ok());
        assert!(matches!(
            detection.outline,
            Err(LocateError::InsufficientCorrespondences { needed: 4, got: 3 })
        ));
        assert!(detection.found());
    }

    #[test]
    fn test_empty_scene_reports_no_matches() {
        let ght = Ght::new(LocalizerConfig::default()).unwrap();
        let template = template_features();
        let scene = Features::new(Vec::new(), Vec::<Vec<u8>>::new()).unwrap();

        let detection = ght.localize(&template, &scene, TEMPLATE, SCENE).unwrap();
        assert!(detection.matches.is_empty());
        assert_eq!(detection.center, Err(LocateError::NoMatches));
        assert!(matches!(detection.outline, Err(LocateError::NoMatches)));
        assert!(!detection.found());
    }

    #[test]
    fn test_mixed_descriptor_kinds_rejected() {
        let ght = Ght::new(LocalizerConfig::default()).unwrap();
        let t = FeatureFile {
            keypoints: vec![Keypoint::new(1.0, 1.0, 4.0, 0.0)],
            descriptors: Descriptors::Binary(vec![vec![0u8; 32]]),
        };
        let s = FeatureFile {
            keypoints: vec![Keypoint::new(1.0, 1.0, 4.0, 0.0)],
            descriptors: Descriptors::Float(vec![vec![0.0; 32]]),
        };
        assert!(matches!(
            ght.localize_files(t, s, TEMPLATE, SCENE),
            Err(GhtError::InvalidInput(_))
        ));
    }
}

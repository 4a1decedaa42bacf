use ght_core::{BinSize, FilterPolicy, MatchConfig, Norm};
use crate::config::LocalizerConfig;
use crate::error::LocateResult;
use crate::localizer::Localizer;
use crate::ransac::RansacParams;

/// Builder for creating a `Localizer`
#[derive(Debug, Clone)]
pub struct LocalizerBuilder {
    core: MatchConfig,
    bin_size: BinSize,
    ransac: RansacParams,
}

impl Default for LocalizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalizerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::from_config(LocalizerConfig::default())
    }

    /// Lowe's ratio test with the given threshold
    pub fn ratio_test(mut self, ratio: f32) -> Self {
        self.core.policy = FilterPolicy::ratio(ratio);
        self
    }

    /// Mutual k-nearest-neighbour check
    pub fn cross_check(mut self, k: usize) -> Self {
        self.core.policy = FilterPolicy::cross_check(k);
        self
    }

    /// Override the descriptor distance
    pub fn norm(mut self, norm: Norm) -> Self {
        self.core.norm = Some(norm);
        self
    }

    /// Discard accepted matches farther apart than `distance`
    pub fn max_distance(mut self, distance: f32) -> Self {
        self.core.max_distance = Some(distance);
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.core.n_threads = n_threads;
        self
    }

    /// Square vote cells of `pixels` on a side
    pub fn bin_pixels(mut self, pixels: usize) -> Self {
        self.bin_size = BinSize::Pixels(pixels);
        self
    }

    /// `n` vote cells along each scene axis
    pub fn bin_divisions(mut self, n: usize) -> Self {
        self.bin_size = BinSize::Divisions(n);
        self
    }

    pub fn reproj_threshold(mut self, pixels: f64) -> Self {
        self.ransac.reproj_threshold = pixels;
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.ransac.max_iterations = iterations;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.ransac.confidence = confidence;
        self
    }

    /// Reject outlines supported by fewer than this fraction of matches
    pub fn min_inlier_ratio(mut self, ratio: f64) -> Self {
        self.ransac.min_inlier_ratio = ratio;
        self
    }

    /// Enable or disable the least-squares refit on inliers
    pub fn refine(mut self, enable: bool) -> Self {
        self.ransac.refine = enable;
        self
    }

    /// Fix the sampling seed, or draw from OS entropy with `None`
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.ransac.seed = seed;
        self
    }

    /// Apply the strict preset
    pub fn preset_strict(self) -> Self {
        Self::from_config(LocalizerConfig::strict_preset())
    }

    /// Apply the permissive preset
    pub fn preset_permissive(self) -> Self {
        Self::from_config(LocalizerConfig::permissive_preset())
    }

    /// Build the `Localizer`
    pub fn build(self) -> LocateResult<Localizer> {
        Localizer::new(self.to_config())
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `LocalizerConfig`
    pub fn from_config(config: LocalizerConfig) -> Self {
        let ransac = config.ransac_params();
        Self {
            core: config.core,
            bin_size: config.bin_size,
            ransac,
        }
    }

    /// Convert the builder into a `LocalizerConfig`
    pub fn to_config(self) -> LocalizerConfig {
        LocalizerConfig {
            core: self.core,
            bin_size: self.bin_size,
            reproj_threshold: self.ransac.reproj_threshold,
            max_iterations: self.ransac.max_iterations,
            confidence: self.ransac.confidence,
            min_inlier_ratio: self.ransac.min_inlier_ratio,
            refine: self.ransac.refine,
            seed: self.ransac.seed,
            name: None,
            description: None,
            version: None,
        }
    }
}

use ght_core::{BinSize, FilterPolicy, MatchConfig};
use crate::builder::LocalizerBuilder;
use crate::error::{LocateError, LocateResult};
use crate::ransac::RansacParams;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete localization configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocalizerConfig {
    /// Correspondence filtering settings
    pub core: MatchConfig,
    /// Vote grid cell size
    pub bin_size: BinSize,
    /// Robust homography fitting
    pub reproj_threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
    pub min_inlier_ratio: f64,
    pub refine: bool,
    pub seed: Option<u64>,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        let ransac = RansacParams::default();
        Self {
            core: MatchConfig::default(),
            bin_size: BinSize::default(),
            reproj_threshold: ransac.reproj_threshold,
            max_iterations: ransac.max_iterations,
            confidence: ransac.confidence,
            min_inlier_ratio: ransac.min_inlier_ratio,
            refine: ransac.refine,
            seed: ransac.seed,
            name: None,
            description: None,
            version: None,
        }
    }
}

impl LocalizerConfig {
    /// Create new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross-check matching with a tight reprojection tolerance
    pub fn strict_preset() -> Self {
        Self {
            core: MatchConfig {
                policy: FilterPolicy::cross_check(1),
                ..MatchConfig::default()
            },
            reproj_threshold: 2.0,
            max_iterations: 5000,
            confidence: 0.999,
            min_inlier_ratio: 0.25,
            name: Some("Strict".to_string()),
            description: Some("Mutual nearest neighbours and a tight inlier threshold".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Lenient ratio test for cluttered or low-texture scenes
    pub fn permissive_preset() -> Self {
        Self {
            core: MatchConfig {
                policy: FilterPolicy::ratio(0.8),
                ..MatchConfig::default()
            },
            reproj_threshold: 5.0,
            name: Some("Permissive".to_string()),
            description: Some("Ratio test at 0.8 with a wide inlier threshold".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Convert to LocalizerBuilder for further customization
    pub fn to_builder(self) -> LocalizerBuilder {
        LocalizerBuilder::from_config(self)
    }

    /// RANSAC parameters carried by this configuration
    pub fn ransac_params(&self) -> RansacParams {
        RansacParams {
            reproj_threshold: self.reproj_threshold,
            max_iterations: self.max_iterations,
            confidence: self.confidence,
            min_inlier_ratio: self.min_inlier_ratio,
            refine: self.refine,
            seed: self.seed,
        }
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let policy = match self.core.policy {
            FilterPolicy::RatioTest { ratio } => format!("ratio<{ratio}"),
            FilterPolicy::CrossCheck { k } => format!("cross-check k={k}"),
        };
        format!(
            "LocalizerConfig: policy={}, norm={:?}, bins={:?}, reproj={:.1}px, iters<={}, confidence={}, min_inliers={:.0}%",
            policy,
            self.core.norm,
            self.bin_size,
            self.reproj_threshold,
            self.max_iterations,
            self.confidence,
            self.min_inlier_ratio * 100.0
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> LocateResult<()> {
        match self.core.policy {
            FilterPolicy::RatioTest { ratio } if !(ratio > 0.0 && ratio <= 1.0) => {
                return Err(LocateError::InvalidConfig(format!("ratio {ratio} must be in (0, 1]")));
            }
            FilterPolicy::CrossCheck { k: 0 } => {
                return Err(LocateError::InvalidConfig("cross-check k must be >= 1".into()));
            }
            _ => {}
        }
        if self.core.n_threads == 0 {
            return Err(LocateError::InvalidConfig("n_threads must be >= 1".into()));
        }
        if !self.bin_size.is_valid() {
            return Err(LocateError::InvalidConfig(format!("bin size {:?} must be positive", self.bin_size)));
        }
        if !(self.reproj_threshold > 0.0) {
            return Err(LocateError::InvalidConfig(format!(
                "reprojection threshold {} must be positive",
                self.reproj_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(LocateError::InvalidConfig("max_iterations must be >= 1".into()));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(LocateError::InvalidConfig(format!("confidence {} must be in (0, 1)", self.confidence)));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_ratio) {
            return Err(LocateError::InvalidConfig(format!(
                "min_inlier_ratio {} must be in [0, 1]",
                self.min_inlier_ratio
            )));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

//! JSON feature files written by an external keypoint detector.
//!
//! ```json
//! {
//!   "keypoints": [{"x": 12.5, "y": 40.0, "size": 31.0, "angle": 87.2}],
//!   "descriptors": {"binary": [[23, 190, 4, ...]]}
//! }
//! ```
//!
//! `descriptors` is either `{"binary": [[u8]]}` or `{"float": [[f32]]}`.
//! A missing `angle` means the detector computed no orientation.

use std::path::Path;

use ght_core::Keypoint;
use serde::{Deserialize, Serialize};

use crate::{GhtError, GhtResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptors {
    Binary(Vec<Vec<u8>>),
    Float(Vec<Vec<f32>>),
}

impl Descriptors {
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(d) => d.len(),
            Descriptors::Float(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Descriptors::Binary(_) => "binary",
            Descriptors::Float(_) => "float",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFile {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Descriptors,
}

impl FeatureFile {
    /// Load from a JSON file, checking that every keypoint has a descriptor
    pub fn load<P: AsRef<Path>>(path: P) -> GhtResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file = Self::from_json(&content)?;
        log::debug!(
            "loaded {} keypoints with {} descriptors from {}",
            file.keypoints.len(),
            file.descriptors.kind(),
            path.display()
        );
        Ok(file)
    }

    pub fn from_json(json: &str) -> GhtResult<Self> {
        let file: Self = serde_json::from_str(json)?;
        if file.keypoints.len() != file.descriptors.len() {
            return Err(GhtError::InvalidInput(format!(
                "{} keypoints but {} descriptors",
                file.keypoints.len(),
                file.descriptors.len()
            )));
        }
        Ok(file)
    }

    pub fn to_json(&self) -> GhtResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

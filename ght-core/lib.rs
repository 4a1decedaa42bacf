#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geometric center of the image plane
    pub fn center(&self) -> Point2 {
        Point2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Corners in winding order: (0,0), (W,0), (W,H), (0,H)
    pub fn corners(&self) -> [Point2; 4] {
        let (w, h) = (self.width as f32, self.height as f32);
        [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }
}

/// Key-point as produced by an external detector
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the feature support region
    pub size: f32,
    /// Degrees in [0, 360), or `UNDEFINED_ANGLE`
    #[cfg_attr(feature = "serde", serde(default = "Keypoint::undefined_angle"))]
    pub angle: f32,
}

impl Keypoint {
    /// Sentinel for detectors that do not estimate orientation
    pub const UNDEFINED_ANGLE: f32 = -1.0;

    pub fn new(x: f32, y: f32, size: f32, angle: f32) -> Self {
        Self { x, y, size, angle }
    }

    pub fn pt(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Orientation in degrees, `None` when the detector left it undefined
    pub fn orientation(&self) -> Option<f32> {
        if self.angle < 0.0 || !self.angle.is_finite() {
            None
        } else {
            Some(self.angle)
        }
    }

    #[cfg(feature = "serde")]
    fn undefined_angle() -> f32 {
        Self::UNDEFINED_ANGLE
    }
}

/// Correspondence between a template keypoint (query) and a scene keypoint (train)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

impl Match {
    pub fn new(query_idx: usize, train_idx: usize, distance: f32) -> Self {
        Self { query_idx, train_idx, distance }
    }

    /// Same correspondence seen from the other image
    pub fn reversed(&self) -> Self {
        Self::new(self.train_idx, self.query_idx, self.distance)
    }
}

/// Descriptor distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Norm {
    Hamming,
    L1,
    L2,
}

/// Fixed-length descriptor vector, opaque apart from its distance metric
pub trait Descriptor: Send + Sync {
    /// Whether the vector holds packed bits, i.e. supports `Norm::Hamming`
    const BINARY: bool;

    fn dim(&self) -> usize;

    /// Distance under `norm`; callers validate `norm` against `BINARY` first
    fn distance(&self, other: &Self, norm: Norm) -> f32;
}

#[inline]
fn byte_distance(a: &[u8], b: &[u8], norm: Norm) -> f32 {
    match norm {
        Norm::Hamming => a
            .iter()
            .zip(b)
            .map(|(&x, &y)| (x ^ y).count_ones())
            .sum::<u32>() as f32,
        Norm::L1 => a
            .iter()
            .zip(b)
            .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
            .sum::<u32>() as f32,
        Norm::L2 => (a
            .iter()
            .zip(b)
            .map(|(&x, &y)| {
                let d = x as i32 - y as i32;
                (d * d) as u32
            })
            .sum::<u32>() as f32)
            .sqrt(),
    }
}

impl<const N: usize> Descriptor for [u8; N] {
    const BINARY: bool = true;

    fn dim(&self) -> usize {
        N
    }

    fn distance(&self, other: &Self, norm: Norm) -> f32 {
        byte_distance(self, other, norm)
    }
}

impl Descriptor for Vec<u8> {
    const BINARY: bool = true;

    fn dim(&self) -> usize {
        self.len()
    }

    fn distance(&self, other: &Self, norm: Norm) -> f32 {
        byte_distance(self, other, norm)
    }
}

impl Descriptor for Vec<f32> {
    const BINARY: bool = false;

    fn dim(&self) -> usize {
        self.len()
    }

    fn distance(&self, other: &Self, norm: Norm) -> f32 {
        let diffs = self.iter().zip(other).map(|(a, b)| a - b);
        match norm {
            Norm::L1 => diffs.map(f32::abs).sum(),
            // Hamming is rejected upstream for real-valued vectors
            Norm::L2 | Norm::Hamming => diffs.map(|d| d * d).sum::<f32>().sqrt(),
        }
    }
}

/// Correspondence filtering policy
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum FilterPolicy {
    /// Accept the nearest neighbour only if `d1 < ratio * d2`
    RatioTest { ratio: f32 },
    /// Accept a forward match only if the backward k-NN list agrees
    CrossCheck { k: usize },
}

impl FilterPolicy {
    pub const DEFAULT_RATIO: f32 = 0.6;
    pub const DEFAULT_CROSS_CHECK_K: usize = 1;

    pub fn ratio(ratio: f32) -> Self {
        FilterPolicy::RatioTest { ratio }
    }

    pub fn cross_check(k: usize) -> Self {
        FilterPolicy::CrossCheck { k }
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::RatioTest { ratio: Self::DEFAULT_RATIO }
    }
}

/// Vote-grid cell size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BinSize {
    /// Square cells of this many pixels
    Pixels(usize),
    /// This many cells along each scene axis
    Divisions(usize),
}

impl BinSize {
    /// Cell width and height in pixels for a scene of `size`
    pub fn resolve(&self, size: ImageSize) -> (usize, usize) {
        match *self {
            BinSize::Pixels(b) => (b, b),
            BinSize::Divisions(n) => {
                let n = n.max(1);
                (size.width.div_ceil(n).max(1), size.height.div_ceil(n).max(1))
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            BinSize::Pixels(b) => b > 0,
            BinSize::Divisions(n) => n > 0,
        }
    }
}

impl Default for BinSize {
    fn default() -> Self {
        BinSize::Pixels(10)
    }
}

/// Matching stage configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    pub policy: FilterPolicy,
    /// `None` picks Hamming for binary descriptors and L2 otherwise
    pub norm: Option<Norm>,
    /// Reject accepted matches farther apart than this
    pub max_distance: Option<f32>,
    pub n_threads: usize,
}

impl MatchConfig {
    /// Norm to use for descriptors of type `D`
    pub fn norm_for<D: Descriptor>(&self) -> Norm {
        self.norm
            .unwrap_or(if D::BINARY { Norm::Hamming } else { Norm::L2 })
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            policy: FilterPolicy::default(),
            norm: None,
            max_distance: None,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .inspect(|_| log::debug!("global thread pool initialized with {n_threads} threads"))
}

use std::path::{Path, PathBuf};
use std::time::Instant;

use argh::FromArgs;
use ght_cli::overlay::render_overlay;
use ght_cli::{DetectionReport, FeatureFile, Ght};
use ght_core::{BinSize, FilterPolicy, ImageSize};
use ght_locate::LocalizerConfig;

/// Locates a template image inside a scene image from precomputed keypoint features
#[derive(Debug, FromArgs)]
struct Args {
    /// template image path
    #[argh(positional)]
    template: PathBuf,

    /// scene image path
    #[argh(positional)]
    scene: PathBuf,

    /// template keypoints and descriptors (JSON)
    #[argh(option, short = 't')]
    template_features: PathBuf,

    /// scene keypoints and descriptors (JSON)
    #[argh(option, short = 's')]
    scene_features: PathBuf,

    /// localizer configuration (.toml or .json)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// ratio test threshold
    #[argh(option, short = 'r')]
    ratio: Option<f32>,

    /// use the cross-check with this many neighbours instead of the ratio test
    #[argh(option, short = 'k')]
    cross_check: Option<usize>,

    /// vote cell size in pixels
    #[argh(option, short = 'b')]
    bin_size: Option<usize>,

    /// vote cells per scene axis (overrides --bin-size)
    #[argh(option)]
    bin_divisions: Option<usize>,

    /// RANSAC inlier threshold in pixels
    #[argh(option)]
    reproj_threshold: Option<f64>,

    /// RANSAC sampling seed
    #[argh(option)]
    seed: Option<u64>,

    /// write the scene with the detection drawn on it to this path
    #[argh(option, short = 'o')]
    overlay: Option<PathBuf>,
}

fn load_config(path: &Path) -> Result<LocalizerConfig, Box<dyn std::error::Error>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => LocalizerConfig::load_toml(path),
        Some("json") => LocalizerConfig::load_json(path),
        _ => Err(format!("unsupported config format: {}", path.display()).into()),
    }
}

fn image_size(path: &Path) -> Result<ImageSize, Box<dyn std::error::Error>> {
    let (w, h) = image::image_dimensions(path)?;
    Ok(ImageSize::new(w as usize, h as usize))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LocalizerConfig::default(),
    };

    match (args.ratio, args.cross_check) {
        (Some(_), Some(_)) => return Err("--ratio and --cross-check are mutually exclusive".into()),
        (Some(ratio), None) => config.core.policy = FilterPolicy::ratio(ratio),
        (None, Some(k)) => config.core.policy = FilterPolicy::cross_check(k),
        (None, None) => {}
    }
    if let Some(pixels) = args.bin_size {
        config.bin_size = BinSize::Pixels(pixels);
    }
    if let Some(n) = args.bin_divisions {
        config.bin_size = BinSize::Divisions(n);
    }
    if let Some(threshold) = args.reproj_threshold {
        config.reproj_threshold = threshold;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    log::info!("{}", config.summary());

    let template_size = image_size(&args.template)?;
    let scene_size = image_size(&args.scene)?;
    let template = FeatureFile::load(&args.template_features)?;
    let scene = FeatureFile::load(&args.scene_features)?;

    let ght = Ght::new(config)?;

    let t0 = Instant::now();
    let detection = ght.localize_files(template, scene, template_size, scene_size)?;
    log::info!("localized in {:.2?}", t0.elapsed());

    let report = DetectionReport::new(&detection, template_size, scene_size);
    println!("{}", report.to_json()?);

    if let Some(out) = &args.overlay {
        render_overlay(&args.scene, &detection, out)?;
    }
    Ok(())
}

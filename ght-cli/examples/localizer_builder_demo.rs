use ght_cli::overlay::draw_detection;
use ght_cli::{DetectionReport, Features, Ght};
use ght_core::{ImageSize, Keypoint};
use ght_locate::LocalizerBuilder;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;
use std::time::Instant;

const TEMPLATE: ImageSize = ImageSize::new(180, 140);
const SCENE: ImageSize = ImageSize::new(640, 480);

/// Deterministic 64-dimensional float descriptor for feature `i`
fn descriptor(i: usize) -> Vec<f32> {
    (0..64)
        .map(|d| (((i * 7919 + d * 104_729) % 1000) as f32 / 1000.0 - 0.5) * (1.0 + (d % 3) as f32))
        .collect()
}

/// Template features plus a rotated, scaled and shifted copy in the scene with clutter
fn synthetic_pair(angle_deg: f32, scale: f32, shift: (f32, f32)) -> (Features<Vec<f32>>, Features<Vec<f32>>) {
    let n = 60;
    let template_kps: Vec<Keypoint> = (0..n)
        .map(|i| {
            Keypoint::new(
                ((i * 67) % TEMPLATE.width) as f32 + 0.5,
                ((i * 41) % TEMPLATE.height) as f32 + 0.5,
                14.0 + (i % 4) as f32,
                ((i * 53) % 360) as f32,
            )
        })
        .collect();
    let template_desc: Vec<Vec<f32>> = (0..n).map(descriptor).collect();

    let (s, c) = angle_deg.to_radians().sin_cos();
    let mut scene_kps: Vec<Keypoint> = template_kps
        .iter()
        .map(|k| {
            Keypoint::new(
                scale * (c * k.x - s * k.y) + shift.0,
                scale * (s * k.x + c * k.y) + shift.1,
                k.size * scale,
                (k.angle + angle_deg).rem_euclid(360.0),
            )
        })
        .collect();
    let mut scene_desc: Vec<Vec<f32>> = template_desc
        .iter()
        .enumerate()
        .map(|(i, d)| d.iter().map(|v| v + ((i % 5) as f32 - 2.0) * 0.002).collect())
        .collect();

    // Background clutter with unrelated descriptors
    for j in 0..120 {
        scene_kps.push(Keypoint::new(
            ((j * 151) % SCENE.width) as f32,
            ((j * 97) % SCENE.height) as f32,
            12.0,
            ((j * 13) % 360) as f32,
        ));
        scene_desc.push(descriptor(10_000 + j));
    }

    (
        Features { keypoints: template_kps, descriptors: template_desc },
        Features { keypoints: scene_kps, descriptors: scene_desc },
    )
}

fn run_demo(
    builder: LocalizerBuilder,
    template: &Features<Vec<f32>>,
    scene: &Features<Vec<f32>>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("   Config: {}", builder.summary());
    let ght = Ght::new(builder.to_config())?;

    let start = Instant::now();
    let detection = ght.localize(template, scene, TEMPLATE, SCENE)?;
    println!("   ⏱️  Time: {:.2?}", start.elapsed());
    println!("   🔗 {} matches", detection.matches.len());

    let report = DetectionReport::new(&detection, TEMPLATE, SCENE);
    match report.center.found() {
        Some(c) => println!("   🎯 Center near ({:.0}, {:.0}) with {} votes", c.cell_center.x, c.cell_center.y, c.votes),
        None => println!("   ⚠️  No center: {:?}", detection.center.as_ref().err()),
    }
    match report.outline.found() {
        Some(o) => println!("   🟨 Outline with {} inliers ({:.0}%)", o.inliers, o.inlier_ratio * 100.0),
        None => println!("   ⚠️  No outline: {:?}", detection.outline.as_ref().err()),
    }

    let mut canvas = RgbaImage::from_pixel(SCENE.width as u32, SCENE.height as u32, Rgba([32, 32, 32, 255]));
    for kp in &scene.keypoints {
        draw_hollow_circle_mut(&mut canvas, (kp.x.round() as i32, kp.y.round() as i32), 3, Rgba([0, 160, 255, 255]));
    }
    draw_detection(&mut canvas, &detection);
    let filename = format!("ght_detection_{name}.png");
    canvas.save(&filename)?;
    println!("   💾 Saved: {filename}\n");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("🎯 Localizer Builder Demo");
    println!("=========================\n");

    let (template, scene) = synthetic_pair(25.0, 1.4, (320.0, 90.0));

    println!("✨ Demo 1: Default Settings");
    run_demo(LocalizerBuilder::new(), &template, &scene, "default")?;

    println!("🔒 Demo 2: Strict Preset");
    run_demo(LocalizerBuilder::new().preset_strict(), &template, &scene, "strict")?;

    println!("🌊 Demo 3: Permissive Preset");
    run_demo(LocalizerBuilder::new().preset_permissive(), &template, &scene, "permissive")?;

    println!("⚙️  Demo 4: Custom Configuration");
    run_demo(
        LocalizerBuilder::new()
            .cross_check(2)
            .bin_divisions(64)
            .reproj_threshold(2.5)
            .max_iterations(500)
            .seed(None),
        &template,
        &scene,
        "custom",
    )?;

    println!("🎉 All demos completed successfully!");
    Ok(())
}

//! Draws detections onto the scene image.

use std::path::Path;

use ght_core::Point2;
use image::{ImageReader, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::{Detection, GhtResult};

pub const CENTER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Half the extent of the center marker
const CROSS_ARM: f32 = 5.0;

/// Two-pixel wide segment
fn draw_thick_line(canvas: &mut RgbaImage, a: Point2, b: Point2, color: Rgba<u8>) {
    let steep = (b.y - a.y).abs() > (b.x - a.x).abs();
    for offset in [0.0, 1.0] {
        let (dx, dy) = if steep { (offset, 0.0) } else { (0.0, offset) };
        draw_line_segment_mut(canvas, (a.x + dx, a.y + dy), (b.x + dx, b.y + dy), color);
    }
}

/// Diagonal cross centered on `p`
pub fn draw_center(canvas: &mut RgbaImage, p: Point2) {
    let r = CROSS_ARM;
    draw_thick_line(canvas, Point2::new(p.x - r, p.y - r), Point2::new(p.x + r, p.y + r), CENTER_COLOR);
    draw_thick_line(canvas, Point2::new(p.x - r, p.y + r), Point2::new(p.x + r, p.y - r), CENTER_COLOR);
}

/// Marks whatever the detection found; failed stages draw nothing
pub fn draw_detection(canvas: &mut RgbaImage, detection: &Detection) {
    if let Ok(peak) = &detection.center {
        draw_center(canvas, peak.position);
    }
    if let Ok(outline) = &detection.outline {
        for (a, b) in outline.quad.edges() {
            draw_thick_line(canvas, a, b, OUTLINE_COLOR);
        }
    }
}

/// Loads the scene, draws the detection and saves the result
pub fn render_overlay<P: AsRef<Path>, Q: AsRef<Path>>(scene: P, detection: &Detection, output: Q) -> GhtResult<()> {
    let mut canvas = ImageReader::open(scene.as_ref())?.decode()?.into_rgba8();
    draw_detection(&mut canvas, detection);
    canvas.save(output.as_ref())?;
    log::info!("overlay written to {}", output.as_ref().display());
    Ok(())
}

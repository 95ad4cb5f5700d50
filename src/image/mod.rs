pub mod fft;
pub mod loader;
pub mod sampler;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_polygon_mut, draw_hollow_rect_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::path::Path;

use crate::tensor::Tensor2D;
use crate::tracking::region::Region;

/// Define a consistent colour palette for debugging annotations
pub struct DebugColours;
impl DebugColours {
    // Confident detection (high PSR) - bright green
    pub const STRONG: Rgb<u8> = Rgb([0, 255, 0]);
    // Usable detection - yellow
    pub const GOOD: Rgb<u8> = Rgb([255, 255, 0]);
    // Marginal detection - orange
    pub const FAIR: Rgb<u8> = Rgb([255, 165, 0]);
    // Unreliable detection - red
    pub const WEAK: Rgb<u8> = Rgb([255, 0, 0]);
    // Crop window outline - white
    pub const CROP: Rgb<u8> = Rgb([255, 255, 255]);

    /// Palette entry for a peak-to-sidelobe ratio.
    pub fn for_psr(psr: f32) -> Rgb<u8> {
        if psr > 10.0 {
            Self::STRONG
        } else if psr > 5.0 {
            Self::GOOD
        } else if psr > 2.0 {
            Self::FAIR
        } else {
            Self::WEAK
        }
    }
}

/// Draw a tracked region, a crosshair at its centre and optionally the crop window.
pub fn annotate_frame_with_region(
    image: &mut RgbImage,
    region: &Region,
    psr: f32,
    crop_size: Option<(u32, u32)>,
) {
    let colour = DebugColours::for_psr(psr);
    let corners: Vec<Point<f32>> = region.corners().iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_hollow_polygon_mut(image, &corners, colour);

    let (cx, cy) = region.centre();
    let (centre_x, centre_y) = (cx.round() as i32, cy.round() as i32);

    if let Some((w, h)) = crop_size {
        if w > 0 && h > 0 {
            let rect = Rect::at(centre_x - w as i32 / 2, centre_y - h as i32 / 2).of_size(w, h);
            draw_hollow_rect_mut(image, rect, DebugColours::CROP);
        }
    }

    // Draw small crosshair at centre
    let cross_size = 4.min(image.width().min(image.height()) as i32 / 4);
    for d in -cross_size..=cross_size {
        let (x, y) = (centre_x + d, centre_y + d);
        if x >= 0 && x < image.width() as i32 && centre_y >= 0 && centre_y < image.height() as i32 {
            image.put_pixel(x as u32, centre_y as u32, colour);
        }
        if y >= 0 && y < image.height() as i32 && centre_x >= 0 && centre_x < image.width() as i32 {
            image.put_pixel(centre_x as u32, y as u32, colour);
        }
    }

    log::debug!(
        "Region annotation: centre ({:.1}, {:.1}) psr: {:.3}",
        cx,
        cy,
        psr
    );
}

/// Render a response map as a blue-to-red heatmap stretched over its own range
pub fn response_to_heatmap(response: &Tensor2D<f32>) -> RgbImage {
    let (min, max) = response
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = (max - min).max(f32::EPSILON);

    RgbImage::from_fn(response.width as u32, response.height as u32, |x, y| {
        let t = ((response.get(x as usize, y as usize) - min) / range).clamp(0.0, 1.0);
        let red = (t * 255.0) as u8;
        let green = ((1.0 - (2.0 * t - 1.0).abs()) * 255.0) as u8;
        let blue = ((1.0 - t) * 255.0) as u8;
        Rgb([red, green, blue])
    })
}

/// Configuration for debug output
#[derive(Debug, Clone)]
pub struct DebugOutputConfig {
    /// Whether debug output should be saved
    pub enabled: bool,
    /// Base directory for saving debug output
    pub output_dir: Option<String>,
}

impl Default for DebugOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: None,
        }
    }
}

/// Helper function to save debug output with configuration.
pub fn save_debug_output<P: AsRef<Path>>(
    image: &RgbImage,
    filename: P,
    frame_index: usize,
    processing_time: std::time::Duration,
    config: Option<&DebugOutputConfig>,
) -> crate::error::Result<()> {
    let default_config = DebugOutputConfig::default();
    let config = config.unwrap_or(&default_config);

    if config.enabled {
        let path = if let Some(ref dir) = config.output_dir {
            std::fs::create_dir_all(dir)?;
            std::path::Path::new(dir).join(filename.as_ref())
        } else {
            filename.as_ref().to_path_buf()
        };

        image.save(&path)?;
        log::info!(
            "Debug output saved: {} for frame {}. Processing time: {:.3}ms",
            path.display(),
            frame_index,
            processing_time.as_secs_f64() * 1e3
        );
    }

    Ok(())
}

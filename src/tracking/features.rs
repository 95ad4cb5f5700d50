//! Appearance descriptors computed on a cell grid.
//!
//! The tracker only relies on the [`FeatureExtractor`] trait; the built-in extractors are
//! small, dependency-free stand-ins for HOG and colour-naming descriptors.

use image::Rgb32FImage;

use crate::tensor::{FeatureMap, Tensor2D, Tensor3D};

/// Produces a `(width / cell, height / cell, channels)` descriptor from a patch.
pub trait FeatureExtractor {
    fn channels(&self) -> usize;
    fn extract(&self, patch: &Rgb32FImage, cell_size: usize) -> FeatureMap;
}

fn cell_grid(patch: &Rgb32FImage, cell_size: usize) -> (usize, usize) {
    let cell = cell_size.max(1);
    (patch.width() as usize / cell, patch.height() as usize / cell)
}

/// Unsigned gradient-orientation histogram per cell, L2-normalised.
#[derive(Debug, Clone)]
pub struct GradientHistogram {
    pub bins: usize,
}

impl Default for GradientHistogram {
    fn default() -> Self {
        Self { bins: 9 }
    }
}

impl GradientHistogram {
    const NORM_EPS: f32 = 0.01;

    fn luminance(patch: &Rgb32FImage) -> Tensor2D<f32> {
        Tensor2D::from_fn(patch.width() as usize, patch.height() as usize, |x, y| {
            let [r, g, b] = patch.get_pixel(x as u32, y as u32).0;
            0.299 * r + 0.587 * g + 0.114 * b
        })
    }
}

impl FeatureExtractor for GradientHistogram {
    fn channels(&self) -> usize {
        self.bins
    }

    fn extract(&self, patch: &Rgb32FImage, cell_size: usize) -> FeatureMap {
        let cell = cell_size.max(1);
        let (cw, ch) = cell_grid(patch, cell);
        let mut out = Tensor3D::zeros(cw, ch, self.bins);
        if cw == 0 || ch == 0 {
            return out;
        }

        let grey = Self::luminance(patch);
        let (w, h) = grey.dims();
        let bin_width = std::f32::consts::PI / self.bins as f32;

        for y in 0..ch * cell {
            for x in 0..cw * cell {
                let gx = grey.get((x + 1).min(w - 1), y) - grey.get(x.saturating_sub(1), y);
                let gy = grey.get(x, (y + 1).min(h - 1)) - grey.get(x, y.saturating_sub(1));
                let magnitude = gx.hypot(gy);
                if magnitude <= f32::EPSILON {
                    continue;
                }

                // Orientation folded into [0, pi), split linearly between the two nearest bins
                let mut angle = gy.atan2(gx);
                if angle < 0.0 {
                    angle += std::f32::consts::PI;
                }
                let position = angle / bin_width - 0.5;
                let lower = position.floor();
                let frac = position - lower;
                let b0 = (lower as isize).rem_euclid(self.bins as isize) as usize;
                let b1 = (b0 + 1) % self.bins;

                let (cx, cy) = (x / cell, y / cell);
                let c0 = &mut out.channels[b0];
                c0.set(cx, cy, c0.get(cx, cy) + magnitude * (1.0 - frac));
                let c1 = &mut out.channels[b1];
                c1.set(cx, cy, c1.get(cx, cy) + magnitude * frac);
            }
        }

        for cy in 0..ch {
            for cx in 0..cw {
                let energy: f32 = out.channels.iter().map(|c| c.get(cx, cy).powi(2)).sum();
                let norm = (energy + Self::NORM_EPS * Self::NORM_EPS).sqrt();
                for channel in &mut out.channels {
                    channel.set(cx, cy, channel.get(cx, cy) / norm);
                }
            }
        }
        out
    }
}

/// Mean RGB per cell, centred on zero.
#[derive(Debug, Clone, Default)]
pub struct ColorIntensity;

impl FeatureExtractor for ColorIntensity {
    fn channels(&self) -> usize {
        3
    }

    fn extract(&self, patch: &Rgb32FImage, cell_size: usize) -> FeatureMap {
        let cell = cell_size.max(1);
        let (cw, ch) = cell_grid(patch, cell);
        let area = (cell * cell) as f32;
        let channels = (0..3)
            .map(|c| {
                Tensor2D::from_fn(cw, ch, |cx, cy| {
                    let mut sum = 0.0;
                    for y in cy * cell..(cy + 1) * cell {
                        for x in cx * cell..(cx + 1) * cell {
                            sum += patch.get_pixel(x as u32, y as u32).0[c];
                        }
                    }
                    sum / area - 0.5
                })
            })
            .collect();
        Tensor3D::from_channels(channels)
    }
}

/// Concatenates the appearance extractors and applies the cosine window.
///
/// The log-polar descriptor uses a separate extractor and is left unwindowed.
pub struct FeatureAdapter {
    appearance: Vec<Box<dyn FeatureExtractor>>,
    log_polar: Box<dyn FeatureExtractor>,
}

impl Default for FeatureAdapter {
    fn default() -> Self {
        Self::new(
            vec![Box::new(GradientHistogram::default()), Box::new(ColorIntensity)],
            Box::new(GradientHistogram::default()),
        )
    }
}

impl FeatureAdapter {
    pub fn new(appearance: Vec<Box<dyn FeatureExtractor>>, log_polar: Box<dyn FeatureExtractor>) -> Self {
        Self { appearance, log_polar }
    }

    /// Channel count of the appearance descriptor.
    pub fn channels(&self) -> usize {
        self.appearance.iter().map(|e| e.channels()).sum()
    }

    pub fn appearance(&self, patch: &Rgb32FImage, cell_size: usize, window: &Tensor2D<f32>) -> FeatureMap {
        let mut features = self
            .appearance
            .iter()
            .map(|e| e.extract(patch, cell_size))
            .fold(Tensor3D::from_channels(Vec::new()), Tensor3D::concat);
        features.apply_window(window);
        features
    }

    pub fn log_polar_descriptor(&self, patch: &Rgb32FImage, cell_size: usize) -> FeatureMap {
        self.log_polar.extract(patch, cell_size)
    }
}

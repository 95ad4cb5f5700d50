//! Relative scale and rotation from phase correlation of log-polar descriptors.
//!
//! In a log-polar patch a change of scale is a shift along the radial (column) axis and a
//! rotation is a circular shift along the angular (row) axis.

use crate::image::fft::FftEngine;
use crate::tensor::FeatureMap;
use crate::tracking::translation::locate_peak;

const SCALE_RANGE: (f32, f32) = (0.6, 1.4);
const MAX_ROTATION_STEP: f32 = 1.0;
const PHASE_EPS: f32 = 2e-16;

/// Scale and rotation of the observation relative to the model, with the raw correlation peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRotationEstimate {
    pub scale: f32,
    pub rotation: f32,
    pub score: f32,
}

impl ScaleRotationEstimate {
    /// Clamps scale to `[0.6, 1.4]` and zeroes rotations beyond one radian.
    pub fn clamped(self) -> Self {
        Self {
            scale: self.scale.clamp(SCALE_RANGE.0, SCALE_RANGE.1),
            rotation: if self.rotation.abs() > MAX_ROTATION_STEP {
                0.0
            } else {
                self.rotation
            },
            score: self.score,
        }
    }
}

/// Radial scaling of a `window`-sized log-polar remap, so the last column reaches the corner.
pub fn log_polar_magnitude(window: (u32, u32)) -> f32 {
    let (w, h) = (window.0 as f32, window.1 as f32);
    w / ((w * w + h * h) / 4.0).sqrt().ln()
}

/// Normalised cross-power phase correlation of `observed` against `model`.
///
/// Returns the centroid-refined peak offset from the zero-lag cell and the peak value.
pub fn phase_correlation(fft: &mut FftEngine, model: &FeatureMap, observed: &FeatureMap) -> (f32, f32, f32) {
    let mf = fft.forward_stack(model);
    let of = fft.forward_stack(observed);
    let cross = of.channel_sum_with(&mf, |o, m| {
        let num = o * m.conj();
        num / (num.norm() + PHASE_EPS)
    });
    let surface = fft.inverse_real(&cross).circshift_centred();

    let (w, h) = surface.dims();
    let (px, py, score) = locate_peak(&surface, Some(1));
    (px - (w / 2) as f32, py - (h / 2) as f32, score)
}

/// Scale and rotation change between two log-polar descriptors.
///
/// `magnitude` is the radial log scaling of the log-polar remap; a full turn spans the
/// descriptor width.
pub fn estimate_scale_rotation(
    fft: &mut FftEngine,
    model: &FeatureMap,
    observed: &FeatureMap,
    magnitude: f32,
) -> ScaleRotationEstimate {
    let (dx, dy, score) = phase_correlation(fft, model, observed);
    let half_width = observed.width.max(1) as f32 / 2.0;
    ScaleRotationEstimate {
        scale: (dx / magnitude).exp(),
        rotation: dy * std::f32::consts::PI / half_width,
        score,
    }
}

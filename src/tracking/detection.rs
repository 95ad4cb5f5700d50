//! One detection pass (sample, featurise, score, locate, estimate scale/rotation) and the
//! model observation shared by initialisation and update.

use image::imageops::{self, FilterType};
use image::Rgb32FImage;
use log::trace;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::image::fft::FftEngine;
use crate::image::sampler::{extract_affine_subwindow, extract_axis_aligned_patch, log_polar};
use crate::tensor::Tensor2D;
use crate::tracking::color::{centre_likelihood, ColorModel};
use crate::tracking::features::FeatureAdapter;
use crate::tracking::filter::FilterModel;
use crate::tracking::scale_rotation::{estimate_scale_rotation, ScaleRotationEstimate};
use crate::tracking::state::{AppearanceModel, Pose, TrackerState, WindowGeometry};
use crate::tracking::translation::{
    color_response, displacement, filter_response, filter_spectrum, fuse_responses, locate_peak, peak_to_sidelobe,
};

/// Outcome of one detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    pub centre: (f32, f32),
    pub scale_step: f32,
    pub rotation_step: f32,
    /// Peak-to-sidelobe ratio of the fused response.
    pub psr: f32,
    pub scale_score: f32,
    pub response: Tensor2D<f32>,
}

/// Samples `out_size` model-scale pixels at `pose`.
pub fn sample_patch(frame: &Rgb32FImage, pose: Pose, out_size: (u32, u32), oriented: bool) -> Rgb32FImage {
    if oriented {
        extract_affine_subwindow(frame, pose.centre, pose.scale, pose.rotation, out_size)
    } else {
        extract_axis_aligned_patch(frame, pose.centre, WindowGeometry::at_scale(out_size, pose.scale), out_size)
    }
}

/// Log-polar remap of the scale-estimation patch at `pose`.
fn sample_log_polar(frame: &Rgb32FImage, pose: Pose, geometry: &WindowGeometry, oriented: bool) -> Rgb32FImage {
    let size = (
        (pose.scale * geometry.scale_size.0).floor().max(1.0) as u32,
        (pose.scale * geometry.scale_size.1).floor().max(1.0) as u32,
    );
    let (sw, sh) = geometry.scale_window;
    let patch = if oriented {
        let rotated = extract_affine_subwindow(frame, pose.centre, 1.0, pose.rotation, size);
        imageops::resize(&rotated, sw, sh, FilterType::Triangle)
    } else {
        extract_axis_aligned_patch(frame, pose.centre, size, (sw, sh))
    };
    log_polar(&patch, geometry.magnitude)
}

/// Builds a fresh appearance model from the frame at the state's current pose.
pub fn observe_model(
    fft: &mut FftEngine,
    features: &FeatureAdapter,
    config: &TrackerConfig,
    state: &TrackerState,
    frame: &Rgb32FImage,
) -> AppearanceModel {
    let geometry = &state.geometry;
    let cell = geometry.cell_size;
    let pose = state.pose();
    let patch = sample_patch(frame, pose, geometry.window, config.is_rotation);

    let x = features.appearance(&patch, cell, &state.windows.model);
    let xf = fft.forward_stack(&x);
    let filter = FilterModel::train(fft, xf, &state.labels_f, config.kernel_type, config.sigma, config.lambda);

    let lp_patch = sample_log_polar(frame, pose, geometry, config.is_rotation);
    let log_polar = features.log_polar_descriptor(&lp_patch, cell);

    let colour = config
        .use_color_hist
        .then(|| ColorModel::observe(&state.bin_mapping, &patch, config.inter_patch_rate));

    AppearanceModel {
        filter,
        log_polar,
        colour,
    }
}

/// Detects the target around `pose`, returning the moved centre and the scale/rotation step.
///
/// The coarse pass (`polish == false`) searches the larger search window against the
/// zero-padded filter; polishing passes use the model window directly.
pub fn detect(
    fft: &mut FftEngine,
    features: &FeatureAdapter,
    config: &TrackerConfig,
    state: &TrackerState,
    frame: &Rgb32FImage,
    pose: Pose,
    polish: bool,
) -> Result<Detection> {
    let model = state.model.as_ref().ok_or(TrackerError::NotInitialised)?;
    let geometry = &state.geometry;
    let cell = geometry.cell_size;
    let (window, cosine, cells) = if polish {
        (geometry.window, &state.windows.model, geometry.model_cells)
    } else {
        (geometry.search_window, &state.windows.search, geometry.search_cells)
    };

    let patch = sample_patch(frame, pose, window, config.is_rotation);
    let z = features.appearance(&patch, cell, cosine);
    let zf = fft.forward_stack(&z);

    let wf = filter_spectrum(fft, &model.filter, (!polish).then_some(cells));
    let response_cf = filter_response(fft, &wf, &zf);

    let response = match &model.colour {
        Some(colour) if config.use_color_hist => {
            let target = (geometry.target.0 as usize, geometry.target.1 as usize);
            let likelihood = centre_likelihood(&colour.likelihood(&patch), target);
            let response_colour = color_response(&likelihood, response_cf.dims(), cell, target);
            fuse_responses(&response_cf, &response_colour, config.merge_factor)
        }
        _ => response_cf,
    };

    let radius = config.is_subpixel.then_some(config.subpixel_radius);
    let (px, py, peak) = locate_peak(&response, radius);
    let psr = peak_to_sidelobe(&response);

    let rotation = if config.is_rotation { pose.rotation } else { 0.0 };
    let (dx, dy) = displacement((px, py), response.dims(), cell, pose.scale, rotation);
    let moved = Pose {
        centre: (pose.centre.0 + dx, pose.centre.1 + dy),
        ..pose
    };
    trace!(
        "{} pass: peak {:.3} at ({:.2}, {:.2}), psr {:.3}, shift ({:.2}, {:.2})",
        if polish { "polish" } else { "coarse" },
        peak,
        px,
        py,
        psr,
        dx,
        dy
    );

    let lp_patch = sample_log_polar(frame, moved, geometry, config.is_rotation);
    let observed = features.log_polar_descriptor(&lp_patch, cell);
    let estimate = estimate_scale_rotation(fft, &model.log_polar, &observed, geometry.magnitude).clamped();
    let ScaleRotationEstimate { scale, rotation, score } = estimate;

    Ok(Detection {
        centre: moved.centre,
        scale_step: scale,
        rotation_step: if config.is_rotation { rotation } else { 0.0 },
        psr,
        scale_score: score,
        response,
    })
}


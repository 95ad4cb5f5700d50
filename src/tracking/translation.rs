//! Translation detection: correlation response, colour fusion, peak localisation and confidence.

use crate::image::fft::FftEngine;
use crate::tensor::{Spectrum, Tensor2D};
use crate::tracking::color::window_centre_offset;
use crate::tracking::filter::FilterModel;

/// Detection filter `conj(xf) * alphaf / n`.
///
/// When `search_cells` is given the filter is moved to the spatial domain, zero-padded
/// (centred) to the search extent and transformed back.
pub fn filter_spectrum(fft: &mut FftEngine, model: &FilterModel, search_cells: Option<(usize, usize)>) -> Spectrum {
    let n = model.xf.element_count() as f32;
    let wf = model
        .xf
        .map_channels(|xf| xf.zip_map(&model.alphaf, |x, a| x.conj() * a / n));

    match search_cells {
        Some((w, h)) if (w, h) != wf.dims() => wf.map_channels(|c| {
            let spatial = fft.inverse(c).pad_centred(w, h);
            fft.forward(&spatial)
        }),
        _ => wf,
    }
}

/// Real correlation response with zero lag moved to `(width / 2, height / 2)`.
pub fn filter_response(fft: &mut FftEngine, wf: &Spectrum, zf: &Spectrum) -> Tensor2D<f32> {
    let rf = wf.channel_sum_with(zf, |w, z| w * z);
    fft.inverse_real(&rf).circshift_centred()
}

/// Resamples a centre-likelihood map from patch pixels onto the response lattice.
///
/// Response cell `j` corresponds to a displacement of `(j - W/2) * cell` pixels from the
/// patch centre; `window` is the sliding-window extent used to build `centre`.
pub fn color_response(
    centre: &Tensor2D<f32>,
    response_dims: (usize, usize),
    cell_size: usize,
    window: (usize, usize),
) -> Tensor2D<f32> {
    let (rw, rh) = response_dims;
    let (pw, ph) = centre.dims();
    let cell = cell_size as f32;
    let base_x = (pw as f32 - 1.0) / 2.0 - window_centre_offset(window.0);
    let base_y = (ph as f32 - 1.0) / 2.0 - window_centre_offset(window.1);

    Tensor2D::from_fn(rw, rh, |x, y| {
        let px = (x as f32 - (rw / 2) as f32) * cell + base_x;
        let py = (y as f32 - (rh / 2) as f32) * cell + base_y;
        centre.sample_bilinear(px, py)
    })
}

/// `(1 - merge) * filter + merge * colour`.
pub fn fuse_responses(filter: &Tensor2D<f32>, colour: &Tensor2D<f32>, merge_factor: f32) -> Tensor2D<f32> {
    filter.zip_map(colour, |f, c| (1.0 - merge_factor) * f + merge_factor * c)
}

/// Peak position and its raw value.
///
/// With a `radius`, the integer argmax is refined to the response-weighted centroid of
/// the in-bounds `(2r + 1)²` neighbourhood; a vanishing weight sum keeps the integer peak.
pub fn locate_peak(response: &Tensor2D<f32>, radius: Option<usize>) -> (f32, f32, f32) {
    let (px, py, peak) = response.argmax();
    let Some(r) = radius else {
        return (px as f32, py as f32, peak);
    };

    let (w, h) = response.dims();
    let (mut sum, mut sx, mut sy) = (0.0f32, 0.0f32, 0.0f32);
    for y in py.saturating_sub(r)..=(py + r).min(h - 1) {
        for x in px.saturating_sub(r)..=(px + r).min(w - 1) {
            let weight = response.get(x, y);
            sum += weight;
            sx += weight * x as f32;
            sy += weight * y as f32;
        }
    }

    if sum.abs() <= f32::EPSILON {
        (px as f32, py as f32, peak)
    } else {
        (sx / sum, sy / sum, peak)
    }
}

/// Peak-to-sidelobe ratio: `min (peak - r) / (1 - exp(-k d²))` over every non-peak cell,
/// with `k = 4 / (w h)` and `d` the distance to the peak.
pub fn peak_to_sidelobe(response: &Tensor2D<f32>) -> f32 {
    let (w, h) = response.dims();
    if w * h < 2 {
        return 0.0;
    }
    let (px, py, peak) = response.argmax();
    let k = 4.0 / (w * h) as f32;

    let mut ratio = f32::INFINITY;
    for y in 0..h {
        for x in 0..w {
            if x == px && y == py {
                continue;
            }
            let dx = x as f32 - px as f32;
            let dy = y as f32 - py as f32;
            let falloff = 1.0 - (-k * (dx * dx + dy * dy)).exp();
            ratio = ratio.min((peak - response.get(x, y)) / falloff.max(f32::EPSILON));
        }
    }
    ratio
}

/// World-space displacement for a peak at `peak` on a `dims` lattice.
pub fn displacement(peak: (f32, f32), dims: (usize, usize), cell_size: usize, scale: f32, rotation: f32) -> (f32, f32) {
    let step = scale * cell_size as f32;
    let dx = (peak.0 - (dims.0 / 2) as f32) * step;
    let dy = (peak.1 - (dims.1 / 2) as f32) * step;
    let (sn, cs) = rotation.sin_cos();
    (cs * dx - sn * dy, sn * dx + cs * dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelType;
    use crate::image::fft::gaussian_labels;
    use crate::tensor::{FeatureMap, Tensor3D};
    use approx::assert_abs_diff_eq;

    fn blob(w: usize, h: usize, cx: usize, cy: usize) -> FeatureMap {
        Tensor3D::from_channels(vec![Tensor2D::from_fn(w, h, |x, y| {
            let d2 = (x as f32 - cx as f32).powi(2) + (y as f32 - cy as f32).powi(2);
            (-d2 / 4.0).exp()
        })])
    }

    fn trained(fft: &mut FftEngine, x: &FeatureMap) -> FilterModel {
        let (w, h) = x.dims();
        let labels_f = fft.forward_real(&gaussian_labels(w, h, 1.0));
        let xf = fft.forward_stack(x);
        FilterModel::train(fft, xf, &labels_f, KernelType::Linear, 0.5, 1e-4)
    }

    #[test]
    fn response_peaks_at_the_shift() {
        let mut fft = FftEngine::new();
        let model = trained(&mut fft, &blob(16, 16, 8, 8));
        let wf = filter_spectrum(&mut fft, &model, None);

        let zf = fft.forward_stack(&blob(16, 16, 11, 6));
        let response = filter_response(&mut fft, &wf, &zf);
        let (x, y, _) = response.argmax();
        assert_eq!((x, y), (8 + 3, 8 - 2));
    }

    #[test]
    fn padded_filter_correlates_against_larger_search() {
        let mut fft = FftEngine::new();
        let model = trained(&mut fft, &blob(16, 16, 8, 8));
        let wf = filter_spectrum(&mut fft, &model, Some((24, 24)));
        assert_eq!(wf.dims(), (24, 24));

        // Target centred in the search window plus a (+2, +1) move
        let zf = fft.forward_stack(&blob(24, 24, 12 + 2, 12 + 1));
        let response = filter_response(&mut fft, &wf, &zf);
        let (x, y, _) = response.argmax();
        assert_eq!((x, y), (12 + 2, 12 + 1));
    }

    #[test]
    fn subpixel_centroid_of_symmetric_peak_is_exact() {
        let mut response = Tensor2D::<f32>::zeros(9, 9);
        response.set(4, 4, 1.0);
        response.set(3, 4, 0.5);
        response.set(5, 4, 0.5);
        let (x, y, v) = locate_peak(&response, Some(2));
        assert_abs_diff_eq!(x, 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 4.0, epsilon = 1e-6);
        assert_eq!(v, 1.0);

        response.set(5, 4, 0.9);
        let (x, _, _) = locate_peak(&response, Some(2));
        assert!(x > 4.0 && x < 5.0);
    }

    #[test]
    fn centroid_window_stays_in_bounds() {
        let mut response = Tensor2D::<f32>::zeros(5, 5);
        response.set(0, 0, 1.0);
        response.set(1, 0, 1.0);
        let (x, y, _) = locate_peak(&response, Some(2));
        assert_abs_diff_eq!(x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn sharp_peaks_score_higher_than_flat_maps() {
        let mut sharp = Tensor2D::from_fn(15, 15, |_, _| 0.0f32);
        sharp.set(7, 7, 1.0);
        let mean = sharp.mean();

        let mut flat = Tensor2D::from_fn(15, 15, |x, y| mean + if (x + y) % 2 == 0 { 1e-3 } else { -1e-3 });
        let correction = flat.mean() - mean;
        flat = flat.map(|v| v - correction);
        assert_abs_diff_eq!(flat.mean(), mean, epsilon = 1e-6);

        assert!(peak_to_sidelobe(&sharp) > peak_to_sidelobe(&flat));
    }

    #[test]
    fn colour_response_maps_centre_cell_to_patch_centre() {
        // Peak of a 21 px centre-likelihood map sits at index 10, window is odd
        let mut centre = Tensor2D::<f32>::zeros(21, 21);
        centre.set(10, 10, 1.0);
        let response = color_response(&centre, (11, 11), 2, (5, 5));
        assert_eq!(response.argmax(), (5, 5, 1.0));
    }

    #[test]
    fn displacement_follows_rotation() {
        let (dx, dy) = displacement((7.0, 5.0), (10, 10), 4, 0.5, 0.0);
        assert_eq!((dx, dy), (4.0, 0.0));
        let (dx, dy) = displacement((7.0, 5.0), (10, 10), 4, 0.5, std::f32::consts::FRAC_PI_2);
        assert_abs_diff_eq!(dx, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(dy, 4.0, epsilon = 1e-5);
    }
}

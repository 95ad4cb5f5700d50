//! Geometric resampling of frames: rectangular crops, similarity-warped subwindows,
//! the log-polar remap used for scale/rotation estimation, and the inverse mapping
//! from similarity parameters back to corner points.

use image::imageops::{self, FilterType};
use image::{Rgb, Rgb32FImage};

/// Bilinear RGB sample with both coordinates clamped to the image.
fn sample_bilinear(img: &Rgb32FImage, x: f32, y: f32) -> [f32; 3] {
    let (w, h) = img.dimensions();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

/// Sub-pixel rectangle of `size` centred on `centre`; pixels beyond the frame replicate its border.
pub fn get_rect_subpix(frame: &Rgb32FImage, size: (u32, u32), centre: (f32, f32)) -> Rgb32FImage {
    let (w, h) = (size.0.max(1), size.1.max(1));
    let origin_x = centre.0 - (w - 1) as f32 / 2.0;
    let origin_y = centre.1 - (h - 1) as f32 / 2.0;
    Rgb32FImage::from_fn(w, h, |u, v| {
        Rgb(sample_bilinear(frame, origin_x + u as f32, origin_y + v as f32))
    })
}

/// Crops `sample_size` pixels around `centre` and resamples them to `out_size`.
pub fn extract_axis_aligned_patch(
    frame: &Rgb32FImage,
    centre: (f32, f32),
    sample_size: (u32, u32),
    out_size: (u32, u32),
) -> Rgb32FImage {
    let crop = get_rect_subpix(frame, sample_size, centre);
    if crop.dimensions() == out_size {
        crop
    } else {
        imageops::resize(&crop, out_size.0.max(1), out_size.1.max(1), FilterType::Triangle)
    }
}

/// Samples an `out_size` window through the similarity `centre + scale * R(rotation) * offset`.
///
/// Offsets are measured from the window centre. Source coordinates are clamped to the
/// frame independently per axis before bilinear interpolation.
pub fn extract_affine_subwindow(
    frame: &Rgb32FImage,
    centre: (f32, f32),
    scale: f32,
    rotation: f32,
    out_size: (u32, u32),
) -> Rgb32FImage {
    let (w, h) = (out_size.0.max(1), out_size.1.max(1));
    let (sn, cs) = rotation.sin_cos();
    let (a, b) = (scale * cs, scale * sn);
    let half_w = (w - 1) as f32 / 2.0;
    let half_h = (h - 1) as f32 / 2.0;

    Rgb32FImage::from_fn(w, h, |u, v| {
        let du = u as f32 - half_w;
        let dv = v as f32 - half_h;
        let sx = centre.0 + a * du - b * dv;
        let sy = centre.1 + b * du + a * dv;
        Rgb(sample_bilinear(frame, sx, sy))
    })
}

/// Log-polar remap of `patch` about its centre, producing an image of the same size.
///
/// Column `x` samples radius `exp(x / magnitude)`, row `y` samples angle `2π y / height`.
/// Samples falling outside the patch are zero.
pub fn log_polar(patch: &Rgb32FImage, magnitude: f32) -> Rgb32FImage {
    let (w, h) = patch.dimensions();
    let cx = (w as f32 - 1.0) / 2.0;
    let cy = (h as f32 - 1.0) / 2.0;
    let max_x = (w - 1) as f32;
    let max_y = (h - 1) as f32;

    Rgb32FImage::from_fn(w, h, |x, y| {
        let radius = (x as f32 / magnitude).exp();
        let angle = y as f32 * 2.0 * std::f32::consts::PI / h as f32;
        let sx = cx + radius * angle.cos();
        let sy = cy + radius * angle.sin();
        if sx < 0.0 || sy < 0.0 || sx > max_x || sy > max_y {
            Rgb([0.0; 3])
        } else {
            Rgb(sample_bilinear(patch, sx, sy))
        }
    })
}

/// Corners of a `size` rectangle rotated by `rotation` about `centre`,
/// ordered top-left, top-right, bottom-right, bottom-left.
pub fn similarity_to_corners(centre: (f32, f32), rotation: f32, size: (f32, f32)) -> [(f32, f32); 4] {
    let (sn, cs) = rotation.sin_cos();
    let (hw, hh) = (size.0 / 2.0, size.1 / 2.0);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
        (centre.0 + cs * dx - sn * dy, centre.1 + sn * dx + cs * dy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(w: u32, h: u32) -> Rgb32FImage {
        Rgb32FImage::from_fn(w, h, |x, y| {
            let v = (x * 10 + y) as f32 / 255.0;
            Rgb([v, v * 0.5, 1.0 - v])
        })
    }

    #[test]
    fn rect_subpix_copies_pixels_at_integer_centres() {
        let frame = ramp(20, 20);
        let crop = get_rect_subpix(&frame, (5, 3), (10.0, 8.0));
        assert_eq!(crop.dimensions(), (5, 3));
        assert_eq!(crop.get_pixel(0, 0).0, frame.get_pixel(8, 7).0);
        assert_eq!(crop.get_pixel(4, 2).0, frame.get_pixel(12, 9).0);
    }

    #[test]
    fn axis_aligned_patch_resamples_to_output_size() {
        let frame = ramp(40, 40);
        let patch = extract_axis_aligned_patch(&frame, (20.0, 20.0), (16, 12), (8, 6));
        assert_eq!(patch.dimensions(), (8, 6));
    }

    #[test]
    fn affine_identity_matches_rect_crop() {
        let frame = ramp(21, 21);
        let affine = extract_affine_subwindow(&frame, (10.0, 10.0), 1.0, 0.0, (5, 5));
        let crop = get_rect_subpix(&frame, (5, 5), (10.0, 10.0));
        for (a, b) in affine.pixels().zip(crop.pixels()) {
            for c in 0..3 {
                assert_abs_diff_eq!(a.0[c], b.0[c], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn affine_quarter_turn_maps_x_offsets_onto_y() {
        let frame = ramp(21, 21);
        let out = extract_affine_subwindow(&frame, (10.0, 10.0), 1.0, std::f32::consts::FRAC_PI_2, (5, 5));
        let expected = frame.get_pixel(10, 11).0;
        let got = out.get_pixel(3, 2).0;
        for c in 0..3 {
            assert_abs_diff_eq!(got[c], expected[c], epsilon = 1e-4);
        }
    }

    #[test]
    fn affine_clamps_outside_the_frame() {
        let frame = ramp(10, 10);
        let out = extract_affine_subwindow(&frame, (0.0, 0.0), 1.0, 0.0, (5, 5));
        assert_eq!(out.get_pixel(0, 0).0, frame.get_pixel(0, 0).0);
        assert_eq!(out.get_pixel(4, 0).0, frame.get_pixel(2, 0).0);
    }

    #[test]
    fn log_polar_first_column_samples_unit_circle() {
        let patch = Rgb32FImage::from_pixel(16, 16, Rgb([0.5, 0.25, 0.75]));
        let magnitude = 16.0 / (512.0f32 / 4.0).sqrt().ln();
        let lp = log_polar(&patch, magnitude);
        for y in 0..16 {
            assert_abs_diff_eq!(lp.get_pixel(0, y).0[0], 0.5, epsilon = 1e-6);
        }
        assert_eq!(lp.get_pixel(15, 0).0, [0.0; 3]);
    }

    #[test]
    fn corners_of_unrotated_box() {
        let corners = similarity_to_corners((0.0, 0.0), 0.0, (8.0, 4.0));
        assert_eq!(corners, [(-4.0, -2.0), (4.0, -2.0), (4.0, 2.0), (-4.0, 2.0)]);

        let shifted = similarity_to_corners((10.0, 5.0), 0.0, (8.0, 4.0));
        assert_eq!(shifted[0], (6.0, 3.0));
        assert_eq!(shifted[2], (14.0, 7.0));
    }

    #[test]
    fn corners_rotate_about_the_centre() {
        let corners = similarity_to_corners((0.0, 0.0), std::f32::consts::FRAC_PI_2, (8.0, 4.0));
        assert_abs_diff_eq!(corners[1].0, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(corners[1].1, 4.0, epsilon = 1e-5);
    }
}

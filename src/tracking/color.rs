//! Foreground/background colour histograms and the object-likelihood maps built from them.

use image::Rgb32FImage;

use crate::image::sampler::get_rect_subpix;
use crate::tensor::Tensor2D;
use crate::tracking::filter::Blend;

/// Lookup table quantising the 256 levels of a channel into `nbin` bins.
#[derive(Debug, Clone, PartialEq)]
pub struct BinMapping {
    nbin: usize,
    table: Vec<usize>,
}

impl BinMapping {
    pub fn new(nbin: usize) -> Self {
        let nbin = nbin.clamp(1, 256);
        Self {
            nbin,
            table: (0..256).map(|i| i * nbin / 256).collect(),
        }
    }

    pub fn nbin(&self) -> usize {
        self.nbin
    }

    #[inline]
    pub fn bin(&self, level: u8) -> usize {
        self.table[level as usize]
    }

    /// Joint bin index of a normalised RGB pixel.
    #[inline]
    fn index(&self, rgb: [f32; 3]) -> usize {
        let [r, g, b] = rgb.map(|v| self.bin(to_level(v)));
        (r * self.nbin + g) * self.nbin + b
    }
}

fn to_level(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Joint 3-D colour histogram normalised by the pixel count of its patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    nbin: usize,
    bins: Vec<f32>,
}

impl ColorHistogram {
    pub fn from_patch(patch: &Rgb32FImage, mapping: &BinMapping) -> Self {
        let nbin = mapping.nbin();
        let mut bins = vec![0.0f32; nbin * nbin * nbin];
        for pixel in patch.pixels() {
            bins[mapping.index(pixel.0)] += 1.0;
        }
        let count = (patch.width() * patch.height()).max(1) as f32;
        bins.iter_mut().for_each(|b| *b /= count);
        Self { nbin, bins }
    }

    pub fn get(&self, r: usize, g: usize, b: usize) -> f32 {
        self.bins[(r * self.nbin + g) * self.nbin + b]
    }

    pub fn sum(&self) -> f32 {
        self.bins.iter().sum()
    }
}

impl Blend for ColorHistogram {
    fn blend(&self, new: &Self, rate: f32) -> Self {
        assert_eq!(self.nbin, new.nbin, "histogram bin count changed");
        let rate = rate.clamp(0.0, 1.0);
        Self {
            nbin: self.nbin,
            bins: self
                .bins
                .iter()
                .zip(new.bins.iter())
                .map(|(old, fresh)| old * (1.0 - rate) + fresh * rate)
                .collect(),
        }
    }
}

/// Per-pixel `fg / (fg + bg)`; pixels whose colour neither histogram has seen score 0.5.
pub fn likelihood_map(
    patch: &Rgb32FImage,
    background: &ColorHistogram,
    foreground: &ColorHistogram,
    mapping: &BinMapping,
) -> Tensor2D<f32> {
    Tensor2D::from_fn(patch.width() as usize, patch.height() as usize, |x, y| {
        let index = mapping.index(patch.get_pixel(x as u32, y as u32).0);
        let fg = foreground.bins[index];
        let bg = background.bins[index];
        if fg + bg > 0.0 {
            fg / (fg + bg)
        } else {
            0.5
        }
    })
}

/// Mean likelihood in a sliding `window` at every fully contained position.
///
/// Sums come from a zero-bordered integral image read with wrap-around indexing. The
/// result is placed back on the input extent, offset by `(window - 1) / 2`, zeros elsewhere.
pub fn centre_likelihood(map: &Tensor2D<f32>, window: (usize, usize)) -> Tensor2D<f32> {
    let (w, h) = map.dims();
    let mut out = Tensor2D::zeros(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let (sw, sh) = (window.0.clamp(1, w), window.1.clamp(1, h));

    let (iw, ih) = (w + 1, h + 1);
    let mut integral = vec![0.0f64; iw * ih];
    for y in 0..h {
        let mut row = 0.0f64;
        for x in 0..w {
            row += map.get(x, y) as f64;
            integral[(y + 1) * iw + x + 1] = integral[y * iw + x + 1] + row;
        }
    }
    let sat = |x: usize, y: usize| integral[(y % ih) * iw + x % iw];

    let (n2, n1) = (w - sw + 1, h - sh + 1);
    let (off_x, off_y) = ((sw - 1) / 2, (sh - 1) / 2);
    let area = (sw * sh) as f64;
    for i in 0..n1 {
        for j in 0..n2 {
            let sum = sat(j, i) + sat(j + sw, i + sh) - sat(j, i + sh) - sat(j + sw, i);
            out.set(j + off_x, i + off_y, (sum / area) as f32);
        }
    }
    out
}

/// Sub-pixel offset between a `len`-wide window's centre and the index it is stored at.
pub fn window_centre_offset(len: usize) -> f32 {
    if len % 2 == 0 {
        0.5
    } else {
        0.0
    }
}

/// Background histogram over the whole patch, foreground over a centred inner patch.
#[derive(Debug, Clone)]
pub struct ColorModel {
    pub mapping: BinMapping,
    pub background: ColorHistogram,
    pub foreground: ColorHistogram,
}

impl ColorModel {
    pub fn observe(mapping: &BinMapping, patch: &Rgb32FImage, inter_patch_rate: f32) -> Self {
        let (w, h) = patch.dimensions();
        let inner_size = (
            ((w as f32 * inter_patch_rate).round() as u32).max(1),
            ((h as f32 * inter_patch_rate).round() as u32).max(1),
        );
        let centre = ((w as f32 - 1.0) / 2.0, (h as f32 - 1.0) / 2.0);
        let inner = get_rect_subpix(patch, inner_size, centre);

        Self {
            mapping: mapping.clone(),
            background: ColorHistogram::from_patch(patch, mapping),
            foreground: ColorHistogram::from_patch(&inner, mapping),
        }
    }

    pub fn likelihood(&self, patch: &Rgb32FImage) -> Tensor2D<f32> {
        likelihood_map(patch, &self.background, &self.foreground, &self.mapping)
    }
}

impl Blend for ColorModel {
    fn blend(&self, new: &Self, rate: f32) -> Self {
        Self {
            mapping: self.mapping.clone(),
            background: self.background.blend(&new.background, rate),
            foreground: self.foreground.blend(&new.foreground, rate),
        }
    }
}

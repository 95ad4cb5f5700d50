//! Two-dimensional FFT plumbing and the spectral helpers the tracker builds on:
//! tapering windows and the rolled Gaussian regression target.

use rustfft::{num_complex::Complex32, FftPlanner};

use crate::tensor::{ComplexMap, FeatureMap, Spectrum, Tensor2D};

/// Row/column FFT over `Tensor2D` grids.
///
/// Holds a single planner so repeated transforms of the same extent reuse their plans.
pub struct FftEngine {
    planner: FftPlanner<f32>,
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FftEngine {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Unnormalised forward transform.
    pub fn forward(&mut self, input: &ComplexMap) -> ComplexMap {
        self.transform(input, false)
    }

    /// Inverse transform normalised by `1 / (width * height)`.
    pub fn inverse(&mut self, input: &ComplexMap) -> ComplexMap {
        let mut out = self.transform(input, true);
        let normalisation = 1.0 / (input.width * input.height) as f32;
        for v in &mut out.data {
            *v *= normalisation;
        }
        out
    }

    pub fn forward_real(&mut self, input: &Tensor2D<f32>) -> ComplexMap {
        self.forward(&input.map(|v| Complex32::new(v, 0.0)))
    }

    /// Real part of the inverse transform.
    pub fn inverse_real(&mut self, input: &ComplexMap) -> Tensor2D<f32> {
        self.inverse(input).map(|v| v.re)
    }

    /// Channel-wise forward transform of a real descriptor.
    pub fn forward_stack(&mut self, input: &FeatureMap) -> Spectrum {
        input.map_channels(|c| self.forward_real(c))
    }

    fn transform(&mut self, input: &ComplexMap, inverse: bool) -> ComplexMap {
        let (width, height) = input.dims();
        let mut data = input.data.clone();
        if data.is_empty() {
            return input.clone();
        }

        // Rows
        let row_fft = if inverse {
            self.planner.plan_fft_inverse(width)
        } else {
            self.planner.plan_fft_forward(width)
        };
        data.chunks_exact_mut(width).for_each(|row| row_fft.process(row));

        // Transpose for the column pass
        let mut transposed = vec![Complex32::new(0.0, 0.0); width * height];
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (y, x)))
            .for_each(|(y, x)| transposed[x * height + y] = data[y * width + x]);

        let col_fft = if inverse {
            self.planner.plan_fft_inverse(height)
        } else {
            self.planner.plan_fft_forward(height)
        };
        transposed.chunks_exact_mut(height).for_each(|col| col_fft.process(col));

        // Transpose back
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (y, x)))
            .for_each(|(y, x)| data[y * width + x] = transposed[x * height + y]);

        Tensor2D::from_vec(width, height, data)
    }
}

/// Symmetric Hann taper of length `n`, zero at both ends.
fn hann(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|k| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * k as f32 / denom).cos())
        .collect()
}

/// Separable 2D cosine (Hann) window.
pub fn cosine_window(width: usize, height: usize) -> Tensor2D<f32> {
    let wx = hann(width);
    let wy = hann(height);
    Tensor2D::from_fn(width, height, |x, y| wy[y] * wx[x])
}

/// Gaussian regression target peaked at index `(0, 0)` with circular wrap-around.
pub fn gaussian_labels(width: usize, height: usize, sigma: f32) -> Tensor2D<f32> {
    let inv = 1.0 / (sigma * sigma).max(f32::MIN_POSITIVE);
    Tensor2D::from_fn(width, height, |x, y| {
        let dx = ((x + width / 2) % width) as f32 - (width / 2) as f32;
        let dy = ((y + height / 2) % height) as f32 - (height / 2) as f32;
        (-0.5 * (dx * dx + dy * dy) * inv).exp()
    })
}

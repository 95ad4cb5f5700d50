//! Kernelised correlation filter: kernel evaluation in the frequency domain,
//! ridge regression, and exponential-moving-average model blending.

use std::ops::{Add, Mul};

use crate::config::KernelType;
use crate::image::fft::FftEngine;
use crate::tensor::{ComplexMap, Spectrum, Tensor2D, Tensor3D};

/// Single-channel kernel response `k(x, y)` of two spectra, in the frequency domain.
pub fn kernel_correlation(
    fft: &mut FftEngine,
    xf: &Spectrum,
    yf: &Spectrum,
    kernel: KernelType,
    sigma: f32,
) -> ComplexMap {
    let total = xf.element_count() as f32;
    let cross = xf.channel_sum_with(yf, |a, b| a * b.conj());

    match kernel {
        KernelType::Linear => cross.map(|v| v / total),
        KernelType::Gaussian => {
            let spatial = (xf.width * xf.height) as f32;
            let xx = xf.energy() / spatial;
            let yy = yf.energy() / spatial;
            let xy = fft.inverse_real(&cross);
            let denom = sigma * sigma * total;
            let k = xy.map(|v| (-(xx + yy - 2.0 * v).max(0.0) / denom).exp());
            fft.forward_real(&k)
        }
    }
}

/// Ridge regression in the frequency domain: `labels / (kernel + lambda)`.
pub fn regress(labels_f: &ComplexMap, kernel_f: &ComplexMap, lambda: f32) -> ComplexMap {
    labels_f.zip_map(kernel_f, |y, k| y / (k + lambda))
}

/// Exponential moving average `(1 - rate) * self + rate * new`.
pub trait Blend: Sized {
    fn blend(&self, new: &Self, rate: f32) -> Self;
}

impl<T> Blend for Tensor2D<T>
where
    T: Copy + Default + Mul<f32, Output = T> + Add<Output = T>,
{
    fn blend(&self, new: &Self, rate: f32) -> Self {
        let rate = rate.clamp(0.0, 1.0);
        self.zip_map(new, |old, fresh| old * (1.0 - rate) + fresh * rate)
    }
}

impl<T> Blend for Tensor3D<T>
where
    T: Copy + Default + Mul<f32, Output = T> + Add<Output = T>,
{
    fn blend(&self, new: &Self, rate: f32) -> Self {
        assert_eq!(self.num_channels(), new.num_channels(), "channel count changed");
        Tensor3D::from_channels(
            self.channels
                .iter()
                .zip(new.channels.iter())
                .map(|(old, fresh)| old.blend(fresh, rate))
                .collect(),
        )
    }
}

pub fn blend_model<B: Blend>(old: &B, new: &B, rate: f32) -> B {
    old.blend(new, rate)
}

/// Regressed filter numerator and the appearance template it was trained on.
#[derive(Debug, Clone)]
pub struct FilterModel {
    pub alphaf: ComplexMap,
    pub xf: Spectrum,
}

impl FilterModel {
    /// Trains a filter on `xf` against the label spectrum.
    pub fn train(
        fft: &mut FftEngine,
        xf: Spectrum,
        labels_f: &ComplexMap,
        kernel: KernelType,
        sigma: f32,
        lambda: f32,
    ) -> Self {
        let kf = kernel_correlation(fft, &xf, &xf, kernel, sigma);
        let alphaf = regress(labels_f, &kf, lambda);
        Self { alphaf, xf }
    }
}

impl Blend for FilterModel {
    fn blend(&self, new: &Self, rate: f32) -> Self {
        Self {
            alphaf: self.alphaf.blend(&new.alphaf, rate),
            xf: self.xf.blend(&new.xf, rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::FeatureMap;
    use rustfft::num_complex::Complex32;
    use approx::assert_abs_diff_eq;

    fn descriptor(seed: u32) -> FeatureMap {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
        };
        Tensor3D::from_channels((0..3).map(|_| Tensor2D::from_fn(8, 6, |_, _| next())).collect())
    }

    #[test]
    fn linear_kernel_dc_is_scaled_energy() {
        let mut fft = FftEngine::new();
        let x = descriptor(7);
        let xf = fft.forward_stack(&x);
        let kf = kernel_correlation(&mut fft, &xf, &xf, KernelType::Linear, 0.5);
        // Zero-lag autocorrelation divided by the element count
        let energy: f32 = x.channels.iter().flat_map(|c| c.data.iter()).map(|v| v * v).sum();
        let lag0 = fft.inverse_real(&kf).get(0, 0);
        assert_abs_diff_eq!(lag0, energy / xf.element_count() as f32, epsilon = 1e-4);
    }

    #[test]
    fn gaussian_self_kernel_peaks_at_one() {
        let mut fft = FftEngine::new();
        let xf = fft.forward_stack(&descriptor(3));
        let kf = kernel_correlation(&mut fft, &xf, &xf, KernelType::Gaussian, 0.5);
        let k = fft.inverse_real(&kf);
        let (x, y, peak) = k.argmax();
        assert_eq!((x, y), (0, 0));
        assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-3);
        assert!(k.data.iter().all(|&v| v <= 1.0 + 1e-3 && v > 0.0));
    }

    #[test]
    fn regression_divides_by_regularised_kernel() {
        let labels = Tensor2D::from_vec(2, 1, vec![Complex32::new(2.0, 0.0), Complex32::new(0.0, 1.0)]);
        let kernel = Tensor2D::from_vec(2, 1, vec![Complex32::new(1.0, 0.0), Complex32::new(0.0, 0.0)]);
        let alphaf = regress(&labels, &kernel, 1.0);
        assert_abs_diff_eq!(alphaf.data[0].re, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(alphaf.data[1].im, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn blend_endpoints_are_exact() {
        let old = descriptor(1);
        let new = descriptor(2);
        assert_eq!(blend_model(&old, &new, 1.0), new);
        assert_eq!(blend_model(&old, &new, 0.0), old);

        let mid = blend_model(&old, &new, 0.25);
        let expected = old.channels[1].get(3, 2) * 0.75 + new.channels[1].get(3, 2) * 0.25;
        assert_abs_diff_eq!(mid.channels[1].get(3, 2), expected, epsilon = 1e-6);
    }

    #[test]
    fn blend_clamps_the_rate() {
        let old = Tensor2D::from_vec(1, 1, vec![Complex32::new(1.0, 1.0)]);
        let new = Tensor2D::from_vec(1, 1, vec![Complex32::new(3.0, -1.0)]);
        assert_eq!(old.blend(&new, 4.0), new);
    }
}

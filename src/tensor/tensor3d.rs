use rustfft::num_complex::Complex32;

use super::tensor2d::Tensor2D;

/// Channel-planar stack of equally sized 2D grids (spatial x channel).
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3D<T> {
    pub width: usize,
    pub height: usize,
    pub channels: Vec<Tensor2D<T>>,
}

/// Multi-channel descriptor in the spatial domain.
pub type FeatureMap = Tensor3D<f32>;
/// Multi-channel descriptor in the frequency domain.
pub type Spectrum = Tensor3D<Complex32>;

impl<T: Copy + Default> Tensor3D<T> {
    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels: (0..channels).map(|_| Tensor2D::zeros(width, height)).collect(),
        }
    }

    pub fn from_channels(channels: Vec<Tensor2D<T>>) -> Self {
        let (width, height) = channels.first().map(|c| c.dims()).unwrap_or((0, 0));
        assert!(
            channels.iter().all(|c| c.dims() == (width, height)),
            "all channels must share one spatial shape"
        );
        Self { width, height, channels }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Total element count across all channels.
    pub fn element_count(&self) -> usize {
        self.width * self.height * self.channels.len()
    }

    pub fn concat(mut self, other: Self) -> Self {
        if self.channels.is_empty() {
            return other;
        }
        assert_eq!(self.dims(), other.dims(), "cannot concatenate differently sized stacks");
        self.channels.extend(other.channels);
        self
    }

    pub fn map_channels<U>(&self, f: impl FnMut(&Tensor2D<T>) -> Tensor2D<U>) -> Tensor3D<U> {
        let channels: Vec<Tensor2D<U>> = self.channels.iter().map(f).collect();
        let (width, height) = channels.first().map(|c| c.dims()).unwrap_or(self.dims());
        assert!(
            channels.iter().all(|c| c.dims() == (width, height)),
            "mapped channels must share one spatial shape"
        );
        Tensor3D { width, height, channels }
    }
}

impl Tensor3D<f32> {
    /// Multiplies every channel by the same spatial window.
    pub fn apply_window(&mut self, window: &Tensor2D<f32>) {
        assert_eq!(self.dims(), window.dims(), "window does not match descriptor extent");
        for channel in &mut self.channels {
            for (v, w) in channel.data.iter_mut().zip(window.data.iter()) {
                *v *= w;
            }
        }
    }
}

impl Tensor3D<Complex32> {
    /// Sum over channels of `f(a_c, b_c)` evaluated elementwise.
    pub fn channel_sum_with(
        &self,
        other: &Self,
        mut f: impl FnMut(Complex32, Complex32) -> Complex32,
    ) -> Tensor2D<Complex32> {
        assert_eq!(self.dims(), other.dims(), "spectra differ in extent");
        assert_eq!(self.num_channels(), other.num_channels(), "spectra differ in channel count");
        let mut out = Tensor2D::zeros(self.width, self.height);
        for (a, b) in self.channels.iter().zip(other.channels.iter()) {
            for ((o, &x), &y) in out.data.iter_mut().zip(a.data.iter()).zip(b.data.iter()) {
                *o += f(x, y);
            }
        }
        out
    }

    /// Squared Frobenius norm over every channel.
    pub fn energy(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.data.iter())
            .map(|v| v.norm_sqr())
            .sum()
    }
}

use rustfft::num_complex::Complex32;

/// Row-major 2D grid used for real response maps and single-channel spectra.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor2D<T> {
    pub data: Vec<T>,
    pub width: usize,
    pub height: usize,
}

/// Frequency-domain single-channel map.
pub type ComplexMap = Tensor2D<Complex32>;

impl<T> Tensor2D<T> {
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Copy + Default> Tensor2D<T> {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![T::default(); width * height],
            width,
            height,
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), width * height, "tensor data does not match {}x{}", width, height);
        Self { data, width, height }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { data, width, height }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    pub fn map<U>(&self, f: impl FnMut(T) -> U) -> Tensor2D<U> {
        Tensor2D {
            data: self.data.iter().copied().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    pub fn zip_map<U: Copy, V>(&self, other: &Tensor2D<U>, mut f: impl FnMut(T, U) -> V) -> Tensor2D<V> {
        assert_eq!(self.dims(), other.dims(), "tensor shapes differ");
        Tensor2D {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Circular shift moving index `(0, 0)` to `(width / 2, height / 2)`.
    pub fn circshift_centred(&self) -> Self {
        let (w, h) = self.dims();
        let mut out = Self::zeros(w, h);
        for y in 0..h {
            let ty = (y + h / 2) % h;
            for x in 0..w {
                out.data[ty * w + (x + w / 2) % w] = self.data[y * w + x];
            }
        }
        out
    }

    /// Embeds the grid in a larger zero grid, offset by half the size difference.
    pub fn pad_centred(&self, width: usize, height: usize) -> Self {
        assert!(width >= self.width && height >= self.height, "padding cannot shrink a tensor");
        let off_x = (width - self.width) / 2;
        let off_y = (height - self.height) / 2;
        let mut out = Self::zeros(width, height);
        for y in 0..self.height {
            let src = &self.data[y * self.width..(y + 1) * self.width];
            let start = (y + off_y) * width + off_x;
            out.data[start..start + self.width].copy_from_slice(src);
        }
        out
    }
}

impl Tensor2D<f32> {
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f32
        }
    }

    /// Location and value of the largest element; the first one in row-major order wins ties.
    pub fn argmax(&self) -> (usize, usize, f32) {
        let mut best = (0usize, f32::NEG_INFINITY);
        for (i, &value) in self.data.iter().enumerate() {
            if value > best.1 {
                best = (i, value);
            }
        }
        (best.0 % self.width.max(1), best.0 / self.width.max(1), best.1)
    }

    /// Bilinear sample with coordinates clamped to the grid.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bottom = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_map_accepts_element_types_without_default() {
        use std::num::NonZeroU8;
        let weights = Tensor2D {
            data: vec![NonZeroU8::MIN, NonZeroU8::MAX],
            width: 2,
            height: 1,
        };
        assert_eq!(weights.dims(), (2, 1));
        let base = Tensor2D::from_vec(2, 1, vec![0.5f32, 2.0]);
        let scaled = base.zip_map(&weights, |a, w| a * w.get() as f32);
        assert_eq!(scaled.data, vec![0.5, 510.0]);
    }

    #[test]
    fn circshift_moves_origin_to_centre() {
        let mut t = Tensor2D::<f32>::zeros(5, 4);
        t.set(0, 0, 1.0);
        let shifted = t.circshift_centred();
        assert_eq!(shifted.argmax(), (2, 2, 1.0));
    }

    #[test]
    fn pad_centred_keeps_content_in_middle() {
        let t = Tensor2D::from_vec(2, 2, vec![1.0f32, 2.0, 3.0, 4.0]);
        let padded = t.pad_centred(6, 4);
        assert_eq!(padded.get(2, 1), 1.0);
        assert_eq!(padded.get(3, 2), 4.0);
        assert_eq!(padded.sum(), 10.0);
    }

    #[test]
    fn bilinear_sample_interpolates_and_clamps() {
        let t = Tensor2D::from_fn(4, 4, |x, _| x as f32);
        assert!((t.sample_bilinear(1.25, 2.0) - 1.25).abs() < 1e-6);
        assert_eq!(t.sample_bilinear(-3.0, 0.0), 0.0);
        assert_eq!(t.sample_bilinear(10.0, 10.0), 3.0);
    }
}

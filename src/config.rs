use crate::error::{Result, TrackerError};
use std::fmt;
use std::str::FromStr;

/// Kernel used for the correlation filter's regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelType {
    Gaussian,
    Linear,
}

impl FromStr for KernelType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(KernelType::Gaussian),
            "linear" => Ok(KernelType::Linear),
            other => Err(TrackerError::UnsupportedKernel(other.to_string())),
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelType::Gaussian => write!(f, "gaussian"),
            KernelType::Linear => write!(f, "linear"),
        }
    }
}

/// Every tunable of the tracker.
///
/// Sizes are `(width, height)` in pixels; sample-size bounds are areas in pixels².
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub kernel_type: KernelType,
    /// Context added around the target, as a ratio of its size.
    pub padding: f32,
    /// Ridge regression regulariser.
    pub lambda: f32,
    pub output_sigma_factor: f32,
    /// Learning rate of the filter and its template.
    pub interp_factor: f32,
    /// Descriptor cell side in pixels.
    pub cell_size: u32,
    pub min_image_sample_size: u32,
    pub max_image_sample_size: u32,
    /// Pins the internal sample area to `w * h` instead of clamping it.
    pub fixed_model_size: Option<(u32, u32)>,
    /// Affine sampling and oriented output.
    pub is_rotation: bool,
    /// Bounded re-detection loop after the coarse pass.
    pub is_refinement: bool,
    pub is_subpixel: bool,
    /// Half-width of the translation centroid window.
    pub subpixel_radius: usize,
    /// Weight of the scale score when ranking refinement iterations.
    pub interp_n: f32,
    /// Learning rate of the log-polar template.
    pub learning_rate_scale: f32,
    /// Resolution the log-polar patch is resampled to.
    pub scale_size_window: (u32, u32),
    /// Inner (foreground) histogram patch size relative to the model patch.
    pub inter_patch_rate: f32,
    /// Histogram bins per colour channel.
    pub nbin: usize,
    pub color_update_rate: f32,
    /// Weight of the colour response in the fused map.
    pub merge_factor: f32,
    /// Regions are 4-corner polygons rather than `[x, y, w, h]` boxes.
    pub polygon: bool,
    pub use_color_hist: bool,
    /// Gaussian kernel bandwidth.
    pub sigma: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kernel_type: KernelType::Linear,
            padding: 1.5,
            lambda: 1e-4,
            output_sigma_factor: 0.1,
            interp_factor: 0.01,
            cell_size: 4,
            min_image_sample_size: 100 * 100,
            max_image_sample_size: 350 * 350,
            fixed_model_size: None,
            is_rotation: false,
            is_refinement: false,
            is_subpixel: true,
            subpixel_radius: 2,
            interp_n: 0.85,
            learning_rate_scale: 0.015,
            scale_size_window: (128, 128),
            inter_patch_rate: 0.3,
            nbin: 10,
            color_update_rate: 0.01,
            merge_factor: 0.4,
            polygon: false,
            use_color_hist: true,
            sigma: 0.5,
        }
    }
}

impl TrackerConfig {
    /// Rotation-aware preset: affine sampling, refinement loop and polygon regions.
    pub fn rotation() -> Self {
        Self {
            is_rotation: true,
            is_refinement: true,
            polygon: true,
            ..Self::default()
        }
    }

    /// Checks value ranges, returning `InvalidConfig` on the first violation.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("interp_factor", self.interp_factor),
            ("interp_n", self.interp_n),
            ("learning_rate_scale", self.learning_rate_scale),
            ("color_update_rate", self.color_update_rate),
            ("merge_factor", self.merge_factor),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must lie in [0, 1], got {}", name, value)));
            }
        }
        if !(self.lambda > 0.0) {
            return Err(invalid(format!("lambda must be positive, got {}", self.lambda)));
        }
        if !(self.sigma > 0.0) {
            return Err(invalid(format!("sigma must be positive, got {}", self.sigma)));
        }
        if !(self.padding >= 0.0) {
            return Err(invalid(format!("padding must be non-negative, got {}", self.padding)));
        }
        if !(self.output_sigma_factor > 0.0) {
            return Err(invalid("output_sigma_factor must be positive".to_string()));
        }
        if self.cell_size == 0 {
            return Err(invalid("cell_size must be at least 1".to_string()));
        }
        if self.nbin == 0 || self.nbin > 256 {
            return Err(invalid(format!("nbin must lie in [1, 256], got {}", self.nbin)));
        }
        if self.min_image_sample_size == 0 || self.min_image_sample_size > self.max_image_sample_size {
            return Err(invalid(format!(
                "sample size bounds must satisfy 0 < min <= max, got {}..{}",
                self.min_image_sample_size, self.max_image_sample_size
            )));
        }
        if let Some((w, h)) = self.fixed_model_size {
            if w == 0 || h == 0 {
                return Err(invalid("fixed_model_size must be non-empty".to_string()));
            }
        }
        if self.scale_size_window.0 < 4 || self.scale_size_window.1 < 4 {
            return Err(invalid(format!(
                "scale_size_window must be at least 4x4, got {:?}",
                self.scale_size_window
            )));
        }
        if !(self.inter_patch_rate > 0.0 && self.inter_patch_rate <= 1.0) {
            return Err(invalid(format!(
                "inter_patch_rate must lie in (0, 1], got {}",
                self.inter_patch_rate
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> TrackerError {
    TrackerError::InvalidConfig(message)
}

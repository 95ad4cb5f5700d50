use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::image::fft::{cosine_window, gaussian_labels};
use crate::tensor::{ComplexMap, FeatureMap, Tensor2D};
use crate::tracking::color::{BinMapping, ColorModel};
use crate::tracking::filter::{Blend, FilterModel};
use crate::tracking::scale_rotation::log_polar_magnitude;

/// Extents fixed at initialisation, in the model's reference scale unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowGeometry {
    pub cell_size: usize,
    /// Target extent.
    pub target: (u32, u32),
    /// Model sampling window.
    pub window: (u32, u32),
    /// Coarse search sampling window.
    pub search_window: (u32, u32),
    pub model_cells: (usize, usize),
    pub search_cells: (usize, usize),
    /// Log-polar sampling extent before resampling to `scale_window`.
    pub scale_size: (f32, f32),
    pub scale_window: (u32, u32),
    /// Log-polar radial scaling in pixels of `scale_window`.
    pub magnitude: f32,
    pub output_sigma: f32,
}

impl WindowGeometry {
    /// Derives every window from the initial target size; returns the geometry and the
    /// initial frame-to-model scale factor.
    pub fn derive(target: (f32, f32), config: &TrackerConfig) -> Result<(Self, f32)> {
        let cell = config.cell_size.max(1) as f32;
        let (tw, th) = target;

        let window = (
            (tw * (1.0 + config.padding)).floor(),
            (th * (1.0 + config.padding)).floor(),
        );
        let area = window.0 * window.1;
        let (min_area, max_area) = match config.fixed_model_size {
            Some((w, h)) => ((w * h) as f32, (w * h) as f32),
            None => (
                config.min_image_sample_size as f32,
                config.max_image_sample_size as f32,
            ),
        };
        let mut sc = (area / area.clamp(min_area, max_area)).sqrt();

        let model_cells = (
            ((window.0 / sc).round() / cell).floor() as usize,
            ((window.1 / sc).round() / cell).floor() as usize,
        );
        if model_cells.0 == 0 || model_cells.1 == 0 {
            return Err(TrackerError::InvalidInput(format!(
                "target {:?} is too small for cell size {}",
                target, config.cell_size
            )));
        }
        let window0 = (model_cells.0 as f32 * cell, model_cells.1 as f32 * cell);
        sc = window.0 / window0.0;

        let avg = (window.0 + window.1) / 4.0;
        let search = ((window.0 + avg).floor(), (window.1 + avg).floor());
        let search_cells = (
            even_margin(((search.0 / sc).floor() / cell).floor() as usize, model_cells.0),
            even_margin(((search.1 / sc).floor() / cell).floor() as usize, model_cells.1),
        );
        let search0 = (search_cells.0 as f32 * cell, search_cells.1 as f32 * cell);
        sc = search.0 / search0.0;

        let target0 = (
            ((tw / sc).round() as u32).max(1),
            ((th / sc).round() as u32).max(1),
        );
        let pad = (tw + th) / 2.5;
        let scale_size = ((tw + pad) / sc, (th + pad) / sc);

        let geometry = Self {
            cell_size: config.cell_size.max(1) as usize,
            target: target0,
            window: (window0.0 as u32, window0.1 as u32),
            search_window: (search0.0 as u32, search0.1 as u32),
            model_cells,
            search_cells,
            scale_size,
            scale_window: config.scale_size_window,
            magnitude: log_polar_magnitude(config.scale_size_window),
            output_sigma: (tw * th).sqrt() * config.output_sigma_factor / cell,
        };
        Ok((geometry, sc))
    }

    /// Frame-space extent of `extent` at scale `sc`.
    pub fn at_scale(extent: (u32, u32), sc: f32) -> (u32, u32) {
        (
            (sc * extent.0 as f32).floor().max(1.0) as u32,
            (sc * extent.1 as f32).floor().max(1.0) as u32,
        )
    }

    /// A scale whose model window would collapse below 10 pixels (summed extents).
    pub fn is_degenerate(&self, sc: f32) -> bool {
        (sc * self.window.0 as f32).floor() + (sc * self.window.1 as f32).floor() < 10.0
    }
}

/// Grows `search` by one cell if needed so the margin around `model` is even.
fn even_margin(search: usize, model: usize) -> usize {
    let search = search.max(model);
    search + (search - model) % 2
}

/// Tapering windows for the model and search descriptor grids.
#[derive(Debug, Clone)]
pub struct CosineWindows {
    pub model: Tensor2D<f32>,
    pub search: Tensor2D<f32>,
}

impl CosineWindows {
    pub fn new(geometry: &WindowGeometry) -> Self {
        Self {
            model: cosine_window(geometry.model_cells.0, geometry.model_cells.1),
            search: cosine_window(geometry.search_cells.0, geometry.search_cells.1),
        }
    }
}

/// Everything learned from the target's appearance.
#[derive(Debug, Clone)]
pub struct AppearanceModel {
    pub filter: FilterModel,
    pub log_polar: FeatureMap,
    pub colour: Option<ColorModel>,
}

/// Per-model learning rates.
#[derive(Debug, Clone, Copy)]
pub struct LearningRates {
    pub filter: f32,
    pub log_polar: f32,
    pub colour: f32,
}

impl AppearanceModel {
    pub fn blend(&self, new: &Self, rates: LearningRates) -> Self {
        let colour = match (&self.colour, &new.colour) {
            (Some(old), Some(fresh)) => Some(old.blend(fresh, rates.colour)),
            (_, fresh) => fresh.clone(),
        };
        Self {
            filter: self.filter.blend(&new.filter, rates.filter),
            log_polar: self.log_polar.blend(&new.log_polar, rates.log_polar),
            colour,
        }
    }
}

/// Position, frame-to-model scale and orientation of the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub centre: (f32, f32),
    pub scale: f32,
    pub rotation: f32,
}

/// Mutable state of one tracking session.
#[derive(Debug, Clone)]
pub struct TrackerState {
    pub centre: (f32, f32),
    /// Frame-to-model scale factor, always positive.
    pub scale: f32,
    /// Orientation in radians, wrapped to `(-π, π]`.
    pub rotation: f32,
    pub geometry: WindowGeometry,
    /// Current frame-space model window.
    pub window_size: (u32, u32),
    /// Current frame-space search window.
    pub search_window_size: (u32, u32),
    pub windows: CosineWindows,
    pub labels_f: ComplexMap,
    pub bin_mapping: BinMapping,
    pub model: Option<AppearanceModel>,
}

impl TrackerState {
    pub fn new(
        centre: (f32, f32),
        rotation: f32,
        geometry: WindowGeometry,
        scale: f32,
        labels_f: ComplexMap,
        bin_mapping: BinMapping,
    ) -> Self {
        let windows = CosineWindows::new(&geometry);
        let mut state = Self {
            centre,
            scale,
            rotation: wrap_angle(rotation),
            window_size: (0, 0),
            search_window_size: (0, 0),
            geometry,
            windows,
            labels_f,
            bin_mapping,
            model: None,
        };
        state.refresh_windows();
        state
    }

    pub fn pose(&self) -> Pose {
        Pose {
            centre: self.centre,
            scale: self.scale,
            rotation: self.rotation,
        }
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.centre = pose.centre;
        self.scale = pose.scale;
        self.rotation = wrap_angle(pose.rotation);
        self.refresh_windows();
    }

    /// Labels peaked at the zero-lag cell of the model grid.
    pub fn labels(geometry: &WindowGeometry) -> Tensor2D<f32> {
        gaussian_labels(geometry.model_cells.0, geometry.model_cells.1, geometry.output_sigma)
    }

    /// Applies a scale and rotation step; a step collapsing the window keeps the scale.
    pub fn apply_step(&mut self, scale_step: f32, rotation_step: f32) {
        let step = if self.geometry.is_degenerate(self.scale * scale_step) {
            1.0
        } else {
            scale_step
        };
        self.scale *= step;
        self.rotation = wrap_angle(self.rotation + rotation_step);
        self.refresh_windows();
    }

    fn refresh_windows(&mut self) {
        self.window_size = WindowGeometry::at_scale(self.geometry.window, self.scale);
        self.search_window_size = WindowGeometry::at_scale(self.geometry.search_window, self.scale);
    }

    /// Target extent in frame pixels.
    pub fn target_size(&self) -> (f32, f32) {
        (
            self.scale * self.geometry.target.0 as f32,
            self.scale * self.geometry.target.1 as f32,
        )
    }

    pub fn clamp_centre(&mut self, width: u32, height: u32) {
        self.centre = (
            self.centre.0.clamp(0.0, width.saturating_sub(1) as f32),
            self.centre.1.clamp(0.0, height.saturating_sub(1) as f32),
        );
    }
}

pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

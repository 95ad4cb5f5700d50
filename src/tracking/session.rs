use log::{debug, info};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::image::fft::FftEngine;
use crate::image::loader::Frame;
use crate::image::sampler::similarity_to_corners;
use crate::tensor::Tensor2D;
use crate::tracking::color::BinMapping;
use crate::tracking::detection::{detect, observe_model};
use crate::tracking::features::FeatureAdapter;
use crate::tracking::refinement::Refinement;
use crate::tracking::region::{BoundingBox, Region};
use crate::tracking::state::{LearningRates, TrackerState, WindowGeometry};

/// Data from the most recent detection, for callers that visualise tracking.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Fused response of the accepted detection.
    pub response: Tensor2D<f32>,
    /// Frame-space model window at the time of detection.
    pub crop_size: (u32, u32),
    pub psr: f32,
    pub scale_score: f32,
    /// Accepted refinement iterations; zero when refinement is disabled.
    pub iterations: usize,
}

/// Single-target tracking session.
pub struct SimilarityTracker {
    config: TrackerConfig,
    features: FeatureAdapter,
    fft: FftEngine,
    state: Option<TrackerState>,
    diagnostics: Option<Diagnostics>,
}

impl SimilarityTracker {
    /// Creates a tracker with the built-in feature extractors.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Self::with_features(config, FeatureAdapter::default())
    }

    pub fn with_features(config: TrackerConfig, features: FeatureAdapter) -> Result<Self> {
        config.validate()?;
        info!(
            "Tracker created: {} kernel, cell {}, rotation {}, refinement {}, colour {}",
            config.kernel_type, config.cell_size, config.is_rotation, config.is_refinement, config.use_color_hist
        );
        Ok(Self {
            config,
            features,
            fft: FftEngine::new(),
            state: None,
            diagnostics: None,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&TrackerState> {
        self.state.as_ref()
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn is_initialised(&self) -> bool {
        self.state.is_some()
    }

    /// Starts tracking `region` in `frame`, replacing any previous session state.
    pub fn init(&mut self, frame: &Frame, region: &Region) -> Result<()> {
        let similarity = region.to_similarity(self.config.is_rotation)?;
        let (geometry, scale) = WindowGeometry::derive(similarity.size, &self.config)?;
        let labels_f = self.fft.forward_real(&TrackerState::labels(&geometry));

        let mut state = TrackerState::new(
            similarity.centre,
            similarity.rotation,
            geometry,
            scale,
            labels_f,
            BinMapping::new(self.config.nbin),
        );
        state.model = Some(observe_model(
            &mut self.fft,
            &self.features,
            &self.config,
            &state,
            &frame.pixels,
        ));
        state.clamp_centre(frame.width(), frame.height());

        info!(
            "Tracker initialised at ({:.1}, {:.1}), target {:?}, model window {:?}, search window {:?}, scale {:.3}",
            state.centre.0,
            state.centre.1,
            similarity.size,
            state.geometry.window,
            state.geometry.search_window,
            state.scale
        );
        self.state = Some(state);
        self.diagnostics = None;
        Ok(())
    }

    /// Tracks the target into `frame` and returns its new region.
    pub fn update(&mut self, frame: &Frame) -> Result<Region> {
        let Self {
            config,
            features,
            fft,
            state,
            diagnostics,
        } = self;
        let state = state.as_mut().ok_or(TrackerError::NotInitialised)?;
        let pixels = &frame.pixels;

        let start = state.pose();
        let crop_size = state.window_size;
        let first = detect(fft, features, config, state, pixels, start, false)?;

        let (detection, iterations) = if config.is_refinement {
            let outcome = Refinement::from_config(config).run(&state.geometry, start, first, |pose, polish| {
                detect(fft, features, config, state, pixels, pose, polish)
            })?;
            state.set_pose(outcome.pose);
            (outcome.detection, outcome.iterations)
        } else {
            state.centre = first.centre;
            state.apply_step(first.scale_step, first.rotation_step);
            (first, 0)
        };

        let fresh = observe_model(fft, features, config, state, pixels);
        let rates = LearningRates {
            filter: config.interp_factor,
            log_polar: config.learning_rate_scale,
            colour: config.color_update_rate,
        };
        state.model = Some(match state.model.take() {
            Some(model) => model.blend(&fresh, rates),
            None => fresh,
        });
        state.clamp_centre(frame.width(), frame.height());

        debug!(
            "Frame tracked: centre ({:.2}, {:.2}), scale {:.4}, rotation {:.4}, psr {:.3}, scale score {:.3}, iterations {}",
            state.centre.0,
            state.centre.1,
            state.scale,
            state.rotation,
            detection.psr,
            detection.scale_score,
            iterations
        );

        *diagnostics = Some(Diagnostics {
            response: detection.response,
            crop_size,
            psr: detection.psr,
            scale_score: detection.scale_score,
            iterations,
        });

        Ok(Self::output_region(config, state))
    }

    /// Current target region in the configured output form.
    pub fn region(&self) -> Result<Region> {
        let state = self.state.as_ref().ok_or(TrackerError::NotInitialised)?;
        Ok(Self::output_region(&self.config, state))
    }

    fn output_region(config: &TrackerConfig, state: &TrackerState) -> Region {
        let size = state.target_size();
        if config.polygon {
            let rotation = if config.is_rotation { state.rotation } else { 0.0 };
            Region::Polygon(similarity_to_corners(state.centre, rotation, size))
        } else {
            Region::Rect(BoundingBox::from_centre(state.centre, size))
        }
    }
}

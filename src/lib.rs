//! Similarity Tracker Library
//!
//! Single-target visual tracking with a kernelised correlation filter, extended to recover
//! the full similarity transform (translation, scale and rotation) of the target.
//!
//! ## Pipeline
//!
//! Each call to [`SimilarityTracker::update`] runs:
//!
//! 1. **Detection** (`tracking::detection::detect`)
//!    - Samples a search window around the last position (affine when rotation tracking is on)
//!    - Correlates its descriptor with the learned filter in the frequency domain
//!    - Fuses the response with a colour-histogram likelihood and locates the sub-pixel peak
//!
//! 2. **Scale / rotation estimation** (`tracking::scale_rotation`)
//!    - Log-polar remap of the target neighbourhood, so scale and rotation become shifts
//!    - Phase correlation against the stored log-polar template
//!
//! 3. **Refinement** (`tracking::refinement::Refinement`)
//!    - Re-detects at the updated scale/rotation for up to five iterations while the blended
//!      confidence keeps improving
//!
//! 4. **Model update** (`tracking::detection::observe_model`)
//!    - Retrains the filter and blends filter, template, log-polar template and colour
//!      histograms with their own learning rates
//!
//! ```no_run
//! use similarity_tracker::{Frame, Region, SimilarityTracker, TrackerConfig};
//!
//! # fn main() -> similarity_tracker::Result<()> {
//! let mut tracker = SimilarityTracker::new(TrackerConfig::default())?;
//! let first = Frame::from_file("frame_0001.png")?;
//! tracker.init(&first, &Region::from_values(&[40.0, 40.0, 20.0, 20.0], false)?)?;
//!
//! let next = Frame::from_file("frame_0002.png")?;
//! let region = tracker.update(&next)?;
//! println!("{:?}", region.to_values());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod tensor;
pub mod tracking;

pub use config::{KernelType, TrackerConfig};
pub use error::{Result, TrackerError};
pub use image::{
    annotate_frame_with_region, loader::Frame, response_to_heatmap, save_debug_output, DebugColours,
    DebugOutputConfig,
};
pub use tracking::{BoundingBox, Diagnostics, Region, SimilarityTracker};

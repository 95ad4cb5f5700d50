pub mod color;
pub mod detection;
pub mod features;
pub mod filter;
pub mod refinement;
pub mod region;
pub mod scale_rotation;
pub mod session;
pub mod state;
pub mod translation;

pub use features::{ColorIntensity, FeatureAdapter, FeatureExtractor, GradientHistogram};
pub use region::{BoundingBox, Region};
pub use session::{Diagnostics, SimilarityTracker};
pub use state::{Pose, TrackerState};

pub mod tensor2d;
pub mod tensor3d;

pub use tensor2d::{ComplexMap, Tensor2D};
pub use tensor3d::{FeatureMap, Spectrum, Tensor3D};

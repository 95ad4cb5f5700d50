use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Unsupported kernel type: {0}")]
    UnsupportedKernel(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tracker used before init")]
    NotInitialised,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

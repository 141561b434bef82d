use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

pub type CompareResult<T> = std::result::Result<T, CompareError>;

/// Errors raised by the comparison pipeline. A failed comparison (distance
/// over tolerance) is not an error; it is reported through
/// `compare::ComparisonResult`.
#[derive(Debug, Error)]
pub enum CompareError {
    /// Image could not be loaded or decoded.
    #[error("failed to load image: {message}")]
    Input { message: String },

    /// Invalid option value or incompatible fingerprints.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// Baseline and current screenshots differ in size; no diff can be built.
    #[error(
        "image dimensions differ: baseline {baseline_width}x{baseline_height}, \
         current {current_width}x{current_height}"
    )]
    DimensionMismatch {
        baseline_width: u32,
        baseline_height: u32,
        current_width: u32,
        current_height: u32,
    },

    /// Internal failure while composing the diff image.
    #[error("failed to render diff image: {message}")]
    Render { message: String },
}

/// Accepted forms of image input. Every source is normalized to an
/// `RgbImage` once, before entering the pipeline.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Image(RgbImage),
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<RgbImage> for ImageSource {
    fn from(image: RgbImage) -> Self {
        ImageSource::Image(image)
    }
}

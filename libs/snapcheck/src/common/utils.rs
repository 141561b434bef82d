use super::types::{CompareError, CompareResult, ImageSource};
use image::RgbImage;

pub fn get_current_timestamp_str() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Unique timestamp-based name for a diff image. Persisting the file is the
/// caller's responsibility.
pub fn suggested_diff_filename() -> String {
    format!(
        "diff-{}.png",
        chrono::Local::now().format("%Y%m%d-%H%M%S-%3f")
    )
}

/// Normalize any accepted input form into an RGB buffer.
pub fn load_image(source: ImageSource) -> CompareResult<RgbImage> {
    match source {
        ImageSource::Path(path) => image::open(&path)
            .map(|img| img.to_rgb8())
            .map_err(|e| CompareError::Input {
                message: format!("{}: {}", path.display(), e),
            }),
        ImageSource::Bytes(bytes) => image::load_from_memory(&bytes)
            .map(|img| img.to_rgb8())
            .map_err(|e| CompareError::Input {
                message: format!("in-memory buffer: {}", e),
            }),
        ImageSource::Image(image) => Ok(image),
    }
}

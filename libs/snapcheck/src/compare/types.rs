use crate::common::{CompareError, CompareResult};
use crate::hash::HashAlgorithm;
use crate::mask::MAX_PIXEL_MAGNITUDE;
use crate::regions::ClassifiedRegion;
use crate::render::RenderConfig;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Full configuration for one comparison. `strict()` and `relaxed()` are the
/// two preset entry points; both run the same pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareOptions {
    pub algorithm: HashAlgorithm,
    /// Maximum Hamming distance still considered similar.
    pub tolerance: u32,
    /// Per-pixel Manhattan RGB distance above which a pixel differs.
    pub pixel_tolerance: u32,
    /// Fingerprint grid size; the hash occupies grid_size^2 bits.
    pub grid_size: u32,
    /// Components at or below this pixel area are ignored.
    pub min_region_area: u64,
    /// Disc radius for element-fill expansion of the differing set; 0 turns
    /// the expansion off.
    pub element_fill: u32,
    /// Growth bound for the expansion, as a multiple of the unexpanded
    /// differing-pixel count.
    pub max_fill_growth: f64,
    pub render: RenderConfig,
}

impl CompareOptions {
    pub fn strict() -> Self {
        Self {
            algorithm: HashAlgorithm::Structural,
            tolerance: 5,
            pixel_tolerance: 60,
            grid_size: 8,
            min_region_area: 5000,
            element_fill: 15,
            max_fill_growth: 25.0,
            render: RenderConfig::default(),
        }
    }

    pub fn relaxed() -> Self {
        Self {
            algorithm: HashAlgorithm::Gradient,
            tolerance: 15,
            pixel_tolerance: 10,
            ..Self::strict()
        }
    }

    pub fn validate(&self) -> CompareResult<()> {
        if self.grid_size < 2 {
            return Err(CompareError::Configuration {
                message: format!("grid size must be at least 2, got {}", self.grid_size),
            });
        }
        if self.pixel_tolerance > u32::from(MAX_PIXEL_MAGNITUDE) {
            return Err(CompareError::Configuration {
                message: format!(
                    "pixel tolerance must be within 0..={}, got {}",
                    MAX_PIXEL_MAGNITUDE, self.pixel_tolerance
                ),
            });
        }
        if self.render.outline_thickness == 0 {
            return Err(CompareError::Configuration {
                message: "outline thickness must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.render.fill_opacity) {
            return Err(CompareError::Configuration {
                message: format!(
                    "fill opacity must be within 0.0..=1.0, got {}",
                    self.render.fill_opacity
                ),
            });
        }
        if self.max_fill_growth < 1.0 {
            return Err(CompareError::Configuration {
                message: format!(
                    "max fill growth must be at least 1.0, got {}",
                    self.max_fill_growth
                ),
            });
        }
        Ok(())
    }
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Summary numbers for a failed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStatistics {
    pub total_pixels: u64,
    pub different_pixels: u64,
    pub difference_percentage: f64,
    pub minor_pixels: u64,
    pub moderate_pixels: u64,
    pub severe_pixels: u64,
    pub region_count: usize,
    pub largest_region_area: u64,
    /// Mean raw magnitude over the differing pixels.
    pub mean_magnitude: f64,
}

/// Everything produced for a failed comparison: the rendered diff, a
/// suggested (timestamp-based) filename, statistics and the classified
/// regions. Writing the image to disk is the caller's job.
#[derive(Debug, Clone)]
pub struct DiffArtifacts {
    pub image: RgbImage,
    pub suggested_filename: String,
    pub statistics: DiffStatistics,
    pub regions: Vec<ClassifiedRegion>,
}

/// Outcome of a comparison. `passed == false` is the expected negative
/// result of a regression check, not an error; `diff` is always populated in
/// that case.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub algorithm: HashAlgorithm,
    pub grid_size: u32,
    pub tolerance: u32,
    pub distance: u32,
    pub passed: bool,
    pub diff: Option<DiffArtifacts>,
    /// Pipeline events, in order; the caller decides how (or whether) to log
    /// them.
    pub diagnostics: Vec<String>,
}

impl ComparisonResult {
    /// One-line outcome description naming the algorithm, grid size,
    /// measured distance and configured tolerance.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} hash ({}x{}) distance {} vs tolerance {}",
            if self.passed { "PASS" } else { "FAIL" },
            self.algorithm,
            self.grid_size,
            self.grid_size,
            self.distance,
            self.tolerance
        )
    }
}

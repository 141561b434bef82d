use crate::common::CompareError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// RGB triple used for fills, outlines and the timestamp.
pub type Color = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Region fill + outline compositing (recommended).
    Contours,
    /// Legacy per-pixel recoloring without region grouping.
    Filled,
}

/// Which screenshot backs the rendered diff. Rendering against the baseline
/// shows where a moved element used to be; against the current capture,
/// where it is now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseImage {
    Baseline,
    Current,
}

/// Filters which regions are drawn at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    All,
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub diff_mode: DiffMode,
    pub base_image: BaseImage,
    pub highlight_mode: HighlightMode,
    /// Outline thickness in pixels (contour mode).
    pub outline_thickness: u32,
    /// Color regions by severity tier instead of a single color.
    pub severity_coloring: bool,
    pub minor_color: Color,
    pub moderate_color: Color,
    /// Also the single fill color when severity coloring is off, and the
    /// recolor used by filled mode.
    pub severe_color: Color,
    /// Overlay weight for region fills; the base keeps the remainder.
    pub fill_opacity: f32,
    pub add_timestamp: bool,
    pub timestamp_color: Color,
    pub timestamp_corner: TimestampCorner,
    pub timestamp_font_size: u32,
    pub timestamp_padding: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            diff_mode: DiffMode::Contours,
            base_image: BaseImage::Baseline,
            highlight_mode: HighlightMode::All,
            outline_thickness: 3,
            severity_coloring: false,
            minor_color: [255, 215, 0],
            moderate_color: [255, 140, 0],
            severe_color: [255, 0, 0],
            fill_opacity: 0.3,
            add_timestamp: true,
            timestamp_color: [230, 30, 30],
            timestamp_corner: TimestampCorner::TopRight,
            timestamp_font_size: 14,
            timestamp_padding: 8,
        }
    }
}

impl FromStr for DiffMode {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contours" => Ok(DiffMode::Contours),
            "filled" => Ok(DiffMode::Filled),
            other => Err(CompareError::Configuration {
                message: format!("unknown diff mode '{}'", other),
            }),
        }
    }
}

impl FromStr for BaseImage {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" => Ok(BaseImage::Baseline),
            "current" => Ok(BaseImage::Current),
            other => Err(CompareError::Configuration {
                message: format!("unknown base image '{}'", other),
            }),
        }
    }
}

impl FromStr for HighlightMode {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(HighlightMode::All),
            "added" => Ok(HighlightMode::Added),
            "removed" => Ok(HighlightMode::Removed),
            other => Err(CompareError::Configuration {
                message: format!("unknown highlight mode '{}'", other),
            }),
        }
    }
}

impl FromStr for TimestampCorner {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top-left" => Ok(TimestampCorner::TopLeft),
            "top-right" => Ok(TimestampCorner::TopRight),
            "bottom-left" => Ok(TimestampCorner::BottomLeft),
            "bottom-right" => Ok(TimestampCorner::BottomRight),
            other => Err(CompareError::Configuration {
                message: format!("unknown timestamp corner '{}'", other),
            }),
        }
    }
}

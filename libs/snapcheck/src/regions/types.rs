use crate::mask::PixelTag;
use image::{ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

/// Connected-component labels over the difference mask (0 = background).
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// One connected group of differing pixels.
#[derive(Debug, Clone)]
pub struct Region {
    /// Label in the component image this region was extracted from.
    pub label: u32,
    /// Number of pixels belonging to the component.
    pub area: u64,
    pub bounds: BoundingBox,
    /// Mean raw magnitude over the component's pixels.
    pub mean_magnitude: f64,
    /// Dominant direction among the component's differing pixels.
    pub direction: PixelTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Minor,
    Moderate,
    Severe,
}

/// A region together with its assigned severity.
#[derive(Debug, Clone)]
pub struct ClassifiedRegion {
    pub region: Region,
    pub severity: SeverityTier,
}

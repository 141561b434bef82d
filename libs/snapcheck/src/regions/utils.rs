use super::types::{BoundingBox, LabelImage, Region, SeverityTier};
use crate::mask::{DiffMask, PixelTag};
use image::Luma;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;

const MINOR_FACTOR: f64 = 1.5;
const MODERATE_FACTOR: f64 = 3.0;

/// Label the connected components of the differing set. A 3x3 closing runs
/// first to merge tiny fragmented specks; it is deliberately small so
/// distinct nearby elements stay separate.
pub fn label_mask(mask: &DiffMask) -> LabelImage {
    let binary = mask.to_binary_image();
    let closed = close(&binary, Norm::LInf, 1);
    connected_components(&closed, Connectivity::Eight, Luma([0u8]))
}

/// Extract regions above `min_area` from the mask. The order of returned
/// regions is unspecified.
pub fn extract(mask: &DiffMask, min_area: u64) -> Vec<Region> {
    extract_labeled(&label_mask(mask), mask, min_area)
}

struct RegionAccumulator {
    area: u64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    magnitude_sum: u64,
    added_votes: u64,
    removed_votes: u64,
}

/// Extraction over a precomputed label image, so rendering can reuse the
/// labels without running the component pass twice.
pub fn extract_labeled(labels: &LabelImage, mask: &DiffMask, min_area: u64) -> Vec<Region> {
    let mut accumulators: HashMap<u32, RegionAccumulator> = HashMap::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        let acc = accumulators
            .entry(label)
            .or_insert_with(|| RegionAccumulator {
                area: 0,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                magnitude_sum: 0,
                added_votes: 0,
                removed_votes: 0,
            });

        acc.area += 1;
        acc.min_x = acc.min_x.min(x);
        acc.min_y = acc.min_y.min(y);
        acc.max_x = acc.max_x.max(x);
        acc.max_y = acc.max_y.max(y);
        acc.magnitude_sum += u64::from(mask.magnitude_at(x, y));

        // Direction votes come from the genuinely differing pixels only;
        // pixels pulled in by closing or element fill carry no signal.
        if u32::from(mask.magnitude_at(x, y)) > mask.pixel_tolerance {
            match mask.tag(x, y) {
                PixelTag::Added => acc.added_votes += 1,
                PixelTag::Removed => acc.removed_votes += 1,
                PixelTag::Unchanged => {}
            }
        }
    }

    let regions: Vec<Region> = accumulators
        .into_iter()
        .filter(|(_, acc)| acc.area > min_area)
        .map(|(label, acc)| Region {
            label,
            area: acc.area,
            bounds: BoundingBox {
                x: acc.min_x,
                y: acc.min_y,
                width: acc.max_x - acc.min_x + 1,
                height: acc.max_y - acc.min_y + 1,
            },
            mean_magnitude: acc.magnitude_sum as f64 / acc.area as f64,
            direction: if acc.removed_votes > acc.added_votes {
                PixelTag::Removed
            } else {
                PixelTag::Added
            },
        })
        .collect();

    log::debug!(
        "region extraction: {} region(s) above {} px",
        regions.len(),
        min_area
    );
    regions
}

/// Assign a severity tier from the region's mean magnitude. Boundaries are
/// inclusive on the lower tier.
pub fn classify(region: &Region, pixel_tolerance: u32) -> SeverityTier {
    let tolerance = f64::from(pixel_tolerance);
    if region.mean_magnitude <= tolerance * MINOR_FACTOR {
        SeverityTier::Minor
    } else if region.mean_magnitude <= tolerance * MODERATE_FACTOR {
        SeverityTier::Moderate
    } else {
        SeverityTier::Severe
    }
}

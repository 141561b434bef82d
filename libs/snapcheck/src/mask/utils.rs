use super::types::{DiffMask, PixelTag};
use crate::common::{CompareError, CompareResult};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

/// Largest possible Manhattan RGB distance (255 per channel).
pub const MAX_PIXEL_MAGNITUDE: u16 = 765;

/// Build the per-pixel difference mask between two equal-sized screenshots.
///
/// `element_fill` > 0 dilates the differing set with a disc of that radius so
/// partial edge detections grow into full element coverage; the growth is
/// bounded by `max_fill_growth` (the radius is halved until the on-pixel
/// count stays within that multiple of the original).
pub fn build(
    baseline: &RgbImage,
    current: &RgbImage,
    pixel_tolerance: u32,
    element_fill: u32,
    max_fill_growth: f64,
) -> CompareResult<DiffMask> {
    let (width, height) = baseline.dimensions();
    let (cur_width, cur_height) = current.dimensions();
    if (width, height) != (cur_width, cur_height) {
        return Err(CompareError::DimensionMismatch {
            baseline_width: width,
            baseline_height: height,
            current_width: cur_width,
            current_height: cur_height,
        });
    }

    let pixel_count = (width as usize) * (height as usize);
    let mut magnitude = vec![0u16; pixel_count];
    let mut binary = GrayImage::new(width, height);

    // Pass 1: magnitudes, the binary differing set, and the mean color of
    // the unchanged area of each image (the background estimate the
    // direction rule compares against).
    let mut unchanged_sum_b = [0u64; 3];
    let mut unchanged_sum_c = [0u64; 3];
    let mut unchanged_count = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pb = baseline.get_pixel(x, y);
            let pc = current.get_pixel(x, y);
            let mag = pixel_magnitude(pb, pc);
            magnitude[(y * width + x) as usize] = mag;

            if u32::from(mag) > pixel_tolerance {
                binary.put_pixel(x, y, image::Luma([255u8]));
            } else {
                for ch in 0..3 {
                    unchanged_sum_b[ch] += u64::from(pb[ch]);
                    unchanged_sum_c[ch] += u64::from(pc[ch]);
                }
                unchanged_count += 1;
            }
        }
    }

    let background_b = mean_color(&unchanged_sum_b, unchanged_count);
    let background_c = mean_color(&unchanged_sum_c, unchanged_count);

    let binary = if element_fill > 0 {
        dilate_with_cap(&binary, element_fill, max_fill_growth)
    } else {
        binary
    };

    // Pass 2: tag every differing pixel with a direction. A pixel counts as
    // added when the current capture deviates more from its own background
    // than the baseline does (content appeared there), removed in the
    // mirrored case; ties resolve to added.
    let mut tags = vec![PixelTag::Unchanged; pixel_count];
    let mut different_pixels = 0u64;
    for y in 0..height {
        for x in 0..width {
            if binary.get_pixel(x, y)[0] == 0 {
                continue;
            }
            let deviation_b = background_deviation(baseline.get_pixel(x, y), background_b);
            let deviation_c = background_deviation(current.get_pixel(x, y), background_c);
            tags[(y * width + x) as usize] = if deviation_b > deviation_c {
                PixelTag::Removed
            } else {
                PixelTag::Added
            };
            different_pixels += 1;
        }
    }

    log::debug!(
        "diff mask: {} of {} pixels differ (tolerance {}, fill radius {})",
        different_pixels,
        pixel_count,
        pixel_tolerance,
        element_fill
    );

    Ok(DiffMask {
        width,
        height,
        pixel_tolerance,
        magnitude,
        tags,
        different_pixels,
    })
}

/// Manhattan distance in RGB space, range 0..=765.
fn pixel_magnitude(a: &Rgb<u8>, b: &Rgb<u8>) -> u16 {
    let dr = u16::from(a[0].abs_diff(b[0]));
    let dg = u16::from(a[1].abs_diff(b[1]));
    let db = u16::from(a[2].abs_diff(b[2]));
    dr + dg + db
}

fn mean_color(sums: &[u64; 3], count: u64) -> [f64; 3] {
    if count == 0 {
        // No unchanged pixels to estimate from; fall back to neutral gray.
        return [127.5; 3];
    }
    [
        sums[0] as f64 / count as f64,
        sums[1] as f64 / count as f64,
        sums[2] as f64 / count as f64,
    ]
}

fn background_deviation(pixel: &Rgb<u8>, background: [f64; 3]) -> f64 {
    (f64::from(pixel[0]) - background[0]).abs()
        + (f64::from(pixel[1]) - background[1]).abs()
        + (f64::from(pixel[2]) - background[2]).abs()
}

/// Disc dilation with a growth bound. If the dilated set exceeds
/// `max_growth` times the original on-pixel count, the radius is halved and
/// retried; radius 0 returns the mask untouched.
fn dilate_with_cap(binary: &GrayImage, radius: u32, max_growth: f64) -> GrayImage {
    let original = count_on(binary);
    if original == 0 {
        return binary.clone();
    }

    let mut radius = radius.min(u32::from(u8::MAX));
    while radius > 0 {
        let dilated = dilate(binary, Norm::L2, radius as u8);
        let grown = count_on(&dilated);
        if grown as f64 <= original as f64 * max_growth {
            return dilated;
        }
        log::debug!(
            "element fill radius {} grows mask {}x (cap {}), halving",
            radius,
            grown as f64 / original as f64,
            max_growth
        );
        radius /= 2;
    }
    binary.clone()
}

fn count_on(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] != 0).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn with_block(mut img: RgbImage, x0: u32, y0: u32, size: u32, color: [u8; 3]) -> RgbImage {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, Rgb(color));
            }
        }
        img
    }

    #[test]
    fn test_magnitude_is_channel_sum() {
        assert_eq!(pixel_magnitude(&Rgb([0, 0, 0]), &Rgb([255, 255, 255])), 765);
        assert_eq!(pixel_magnitude(&Rgb([255, 0, 0]), &Rgb([0, 0, 255])), 510);
        assert_eq!(pixel_magnitude(&Rgb([10, 20, 30]), &Rgb([10, 20, 30])), 0);
    }

    #[test]
    fn test_identical_images_have_empty_mask() {
        let img = solid(16, 16, [120, 130, 140]);
        let mask = build(&img, &img, 60, 0, 25.0).unwrap();
        assert_eq!(mask.different_pixels, 0);
        assert!(mask.tags.iter().all(|t| *t == PixelTag::Unchanged));
    }

    #[test]
    fn test_tolerance_boundary_is_exclusive() {
        let baseline = solid(4, 4, [100, 100, 100]);
        // Magnitude exactly 60: not different under tolerance 60.
        let current = solid(4, 4, [120, 120, 120]);
        let mask = build(&baseline, &current, 60, 0, 25.0).unwrap();
        assert_eq!(mask.different_pixels, 0);

        // One step further crosses the threshold.
        let current = solid(4, 4, [121, 120, 120]);
        let mask = build(&baseline, &current, 60, 0, 25.0).unwrap();
        assert_eq!(mask.different_pixels, 16);
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let baseline = solid(10, 10, [0, 0, 0]);
        let current = solid(20, 10, [0, 0, 0]);
        let err = build(&baseline, &current, 60, 0, 25.0).unwrap_err();
        match err {
            CompareError::DimensionMismatch {
                baseline_width,
                current_width,
                ..
            } => {
                assert_eq!(baseline_width, 10);
                assert_eq!(current_width, 20);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_new_element_tags_added() {
        let baseline = solid(40, 40, [255, 255, 255]);
        let current = with_block(baseline.clone(), 10, 10, 8, [0, 0, 0]);
        let mask = build(&baseline, &current, 60, 0, 25.0).unwrap();

        assert_eq!(mask.different_pixels, 64);
        assert_eq!(mask.tag(14, 14), PixelTag::Added);
        assert_eq!(mask.tag(10, 10), PixelTag::Added);
        assert_eq!(mask.tag(0, 0), PixelTag::Unchanged);
    }

    #[test]
    fn test_vanished_element_tags_removed() {
        let current = solid(40, 40, [255, 255, 255]);
        let baseline = with_block(current.clone(), 10, 10, 8, [0, 0, 0]);
        let mask = build(&baseline, &current, 60, 0, 25.0).unwrap();

        assert_eq!(mask.different_pixels, 64);
        assert_eq!(mask.tag(14, 14), PixelTag::Removed);
        assert_eq!(mask.tag(10, 10), PixelTag::Removed);
    }

    #[test]
    fn test_moved_element_tags_both_directions() {
        let background = solid(60, 30, [240, 240, 240]);
        let baseline = with_block(background.clone(), 5, 5, 6, [20, 20, 20]);
        let current = with_block(background, 40, 5, 6, [20, 20, 20]);
        let mask = build(&baseline, &current, 60, 0, 25.0).unwrap();

        assert_eq!(mask.tag(7, 7), PixelTag::Removed);
        assert_eq!(mask.tag(42, 7), PixelTag::Added);
    }

    #[test]
    fn test_element_fill_expands_mask() {
        let baseline = solid(40, 40, [255, 255, 255]);
        let current = with_block(baseline.clone(), 18, 18, 4, [0, 0, 0]);

        let plain = build(&baseline, &current, 60, 0, 25.0).unwrap();
        let filled = build(&baseline, &current, 60, 3, 1000.0).unwrap();
        assert!(filled.different_pixels > plain.different_pixels);
        // A pixel just outside the block is pulled in by the fill.
        assert!(filled.is_different(17, 18));
        assert!(!plain.is_different(17, 18));
    }

    #[test]
    fn test_fill_growth_cap_reduces_radius() {
        let mut binary = GrayImage::new(31, 31);
        binary.put_pixel(15, 15, image::Luma([255u8]));

        // Cap of 2.0 cannot hold any dilation of a single pixel, so the
        // radius collapses to zero and the mask is returned unchanged.
        let capped = dilate_with_cap(&binary, 8, 2.0);
        assert_eq!(count_on(&capped), 1);

        // A generous cap lets the full radius through.
        let grown = dilate_with_cap(&binary, 8, 1000.0);
        assert!(count_on(&grown) > 100);
    }

    #[test]
    fn test_fill_cap_prefers_largest_radius_within_bound() {
        let mut binary = GrayImage::new(41, 41);
        for y in 19..22 {
            for x in 19..22 {
                binary.put_pixel(x, y, image::Luma([255u8]));
            }
        }
        let original = count_on(&binary);

        let capped = dilate_with_cap(&binary, 8, 10.0);
        let grown = count_on(&capped);
        assert!(grown > original);
        assert!(grown as f64 <= original as f64 * 10.0);
    }
}

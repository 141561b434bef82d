use super::types::{CompareOptions, ComparisonResult, DiffArtifacts, DiffStatistics};
use crate::common::{load_image, suggested_diff_filename, CompareError, CompareResult, ImageSource};
use crate::hash;
use crate::mask::{self, DiffMask, PixelTag};
use crate::regions::{self, ClassifiedRegion, SeverityTier};
use crate::render;
use image::RgbImage;

/// Compare two screenshots with the strict preset defaults.
pub fn compare_strict(
    baseline: ImageSource,
    current: ImageSource,
) -> CompareResult<ComparisonResult> {
    compare(baseline, current, &CompareOptions::strict())
}

/// Compare two screenshots with the relaxed preset defaults (gradient hash,
/// wider tolerances).
pub fn compare_relaxed(
    baseline: ImageSource,
    current: ImageSource,
) -> CompareResult<ComparisonResult> {
    compare(baseline, current, &CompareOptions::relaxed())
}

/// Run the full comparison pipeline: fingerprint both images, decide
/// pass/fail against the tolerance, and on failure build the difference
/// mask, extract and classify regions, and render the diff image.
pub fn compare(
    baseline: ImageSource,
    current: ImageSource,
    options: &CompareOptions,
) -> CompareResult<ComparisonResult> {
    options.validate()?;

    let baseline = load_image(baseline)?;
    let current = load_image(current)?;

    // Mismatched dimensions are fatal no matter what the hashes would say.
    if baseline.dimensions() != current.dimensions() {
        let (bw, bh) = baseline.dimensions();
        let (cw, ch) = current.dimensions();
        return Err(CompareError::DimensionMismatch {
            baseline_width: bw,
            baseline_height: bh,
            current_width: cw,
            current_height: ch,
        });
    }

    let mut diagnostics = Vec::new();

    let baseline_fp = hash::fingerprint(&baseline, options.algorithm, options.grid_size)?;
    let current_fp = hash::fingerprint(&current, options.algorithm, options.grid_size)?;
    let distance = hash::distance(&baseline_fp, &current_fp)?;

    let event = format!(
        "{} hash ({}x{}): distance {} (tolerance {})",
        options.algorithm, options.grid_size, options.grid_size, distance, options.tolerance
    );
    log::debug!("{}", event);
    diagnostics.push(event);

    if distance <= options.tolerance {
        return Ok(ComparisonResult {
            algorithm: options.algorithm,
            grid_size: options.grid_size,
            tolerance: options.tolerance,
            distance,
            passed: true,
            diff: None,
            diagnostics,
        });
    }

    let mask = mask::build(
        &baseline,
        &current,
        options.pixel_tolerance,
        options.element_fill,
        options.max_fill_growth,
    )?;
    diagnostics.push(format!(
        "difference mask: {} differing pixel(s)",
        mask.different_pixels
    ));

    let labels = regions::label_mask(&mask);
    let classified: Vec<ClassifiedRegion> =
        regions::extract_labeled(&labels, &mask, options.min_region_area)
            .into_iter()
            .map(|region| ClassifiedRegion {
                severity: regions::classify(&region, options.pixel_tolerance),
                region,
            })
            .collect();
    diagnostics.push(format!(
        "{} region(s) above {} px",
        classified.len(),
        options.min_region_area
    ));

    let image = render::render_diff(
        &baseline,
        &current,
        &mask,
        &labels,
        &classified,
        &options.render,
    )?;
    let statistics = build_statistics(&baseline, &mask, &classified);
    diagnostics.push(format!(
        "rendered diff image ({:.2}% of pixels differ)",
        statistics.difference_percentage
    ));

    Ok(ComparisonResult {
        algorithm: options.algorithm,
        grid_size: options.grid_size,
        tolerance: options.tolerance,
        distance,
        passed: false,
        diff: Some(DiffArtifacts {
            image,
            suggested_filename: suggested_diff_filename(),
            statistics,
            regions: classified,
        }),
        diagnostics,
    })
}

fn build_statistics(
    baseline: &RgbImage,
    mask: &DiffMask,
    classified: &[ClassifiedRegion],
) -> DiffStatistics {
    let (width, height) = baseline.dimensions();
    let total_pixels = u64::from(width) * u64::from(height);

    let mut magnitude_sum = 0u64;
    for (i, tag) in mask.tags.iter().enumerate() {
        if *tag != PixelTag::Unchanged {
            magnitude_sum += u64::from(mask.magnitude[i]);
        }
    }
    let mean_magnitude = if mask.different_pixels > 0 {
        magnitude_sum as f64 / mask.different_pixels as f64
    } else {
        0.0
    };

    let mut minor_pixels = 0u64;
    let mut moderate_pixels = 0u64;
    let mut severe_pixels = 0u64;
    let mut largest_region_area = 0u64;
    for c in classified {
        match c.severity {
            SeverityTier::Minor => minor_pixels += c.region.area,
            SeverityTier::Moderate => moderate_pixels += c.region.area,
            SeverityTier::Severe => severe_pixels += c.region.area,
        }
        largest_region_area = largest_region_area.max(c.region.area);
    }

    DiffStatistics {
        total_pixels,
        different_pixels: mask.different_pixels,
        difference_percentage: if total_pixels > 0 {
            mask.different_pixels as f64 / total_pixels as f64 * 100.0
        } else {
            0.0
        },
        minor_pixels,
        moderate_pixels,
        severe_pixels,
        region_count: classified.len(),
        largest_region_area,
        mean_magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn options_for_tests() -> CompareOptions {
        let mut options = CompareOptions::strict();
        options.algorithm = crate::hash::HashAlgorithm::Gradient;
        options.tolerance = 0;
        options.min_region_area = 50;
        options.element_fill = 0;
        options.render.add_timestamp = false;
        options
    }

    #[test]
    fn test_identical_images_pass_with_zero_distance() {
        let img = solid(100, 100, [255, 0, 0]);
        let result = compare_strict(img.clone().into(), img.into()).unwrap();
        assert!(result.passed);
        assert_eq!(result.distance, 0);
        assert!(result.diff.is_none());
        assert!(result.summary().contains("PASS"));
    }

    #[test]
    fn test_dimension_mismatch_wins_over_hashing() {
        let baseline = solid(100, 100, [255, 0, 0]);
        let current = solid(200, 100, [255, 0, 0]);
        let err = compare_strict(baseline.into(), current.into()).unwrap_err();
        match err {
            CompareError::DimensionMismatch {
                baseline_width,
                baseline_height,
                current_width,
                current_height,
            } => {
                assert_eq!((baseline_width, baseline_height), (100, 100));
                assert_eq!((current_width, current_height), (200, 100));
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_comparison_carries_diff_artifacts() {
        let baseline = solid(100, 100, [255, 0, 0]);
        let mut current = baseline.clone();
        for y in 40..60 {
            for x in 40..60 {
                current.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }

        let result = compare(baseline.into(), current.into(), &options_for_tests()).unwrap();
        assert!(!result.passed);
        assert!(result.distance > 0);

        let diff = result.diff.expect("failed comparison must carry a diff");
        assert_eq!(diff.image.dimensions(), (100, 100));
        assert!(diff.suggested_filename.ends_with(".png"));
        assert_eq!(diff.regions.len(), 1);
        assert_eq!(diff.regions[0].severity, SeverityTier::Severe);

        let stats = diff.statistics;
        assert_eq!(stats.total_pixels, 10_000);
        assert_eq!(stats.different_pixels, 400);
        assert_eq!(stats.region_count, 1);
        assert_eq!(stats.largest_region_area, 400);
        assert_eq!(stats.severe_pixels, 400);
        assert_eq!(stats.minor_pixels, 0);
        assert!((stats.difference_percentage - 4.0).abs() < 1e-9);
        // Red to blue flips two full channels.
        assert!((stats.mean_magnitude - 510.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagnostics_follow_pipeline_stages() {
        let baseline = solid(100, 100, [255, 255, 255]);
        let mut current = baseline.clone();
        for y in 10..40 {
            for x in 10..40 {
                current.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let result = compare(baseline.into(), current.into(), &options_for_tests()).unwrap();
        assert!(!result.passed);
        assert!(result.diagnostics.len() >= 4);
        assert!(result.diagnostics[0].contains("hash"));
        assert!(result.diagnostics[1].contains("mask"));
    }

    #[test]
    fn test_invalid_options_rejected_before_loading() {
        let mut options = CompareOptions::strict();
        options.grid_size = 0;
        let err = compare(
            ImageSource::from("/no/such/file.png"),
            ImageSource::from("/no/such/file.png"),
            &options,
        )
        .unwrap_err();
        // Configuration beats the bad paths: validation runs first.
        assert!(matches!(err, CompareError::Configuration { .. }));
    }
}

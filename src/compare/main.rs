use anyhow::Result;
use clap::Parser;
use snapcheck::compare::{compare, CompareOptions};
use snapcheck::common::ImageSource;
use snapcheck::hash::HashAlgorithm;
use snapcheck::logger::init_logger_exe;
use snapcheck::render::{BaseImage, DiffMode, HighlightMode, TimestampCorner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Compare two screenshots and render a visual diff", long_about = None)]
struct Cli {
    /// Baseline screenshot path
    baseline: PathBuf,

    /// Current screenshot path
    current: PathBuf,

    #[arg(
        long,
        help = "Start from the relaxed preset (gradient hash, wider tolerances)",
        default_value_t = false
    )]
    relaxed: bool,

    #[arg(long, help = "Hash algorithm (structural or gradient)")]
    algorithm: Option<HashAlgorithm>,

    #[arg(long, help = "Maximum Hamming distance still considered similar")]
    tolerance: Option<u32>,

    #[arg(long, help = "Per-pixel color distance above which a pixel differs")]
    pixel_tolerance: Option<u32>,

    #[arg(long, help = "Fingerprint grid size")]
    grid_size: Option<u32>,

    #[arg(long, help = "Diff rendering mode (contours or filled)")]
    diff_mode: Option<DiffMode>,

    #[arg(long, help = "Ignore regions at or below this pixel area")]
    min_region_area: Option<u64>,

    #[arg(long, help = "Outline thickness in pixels")]
    outline_thickness: Option<u32>,

    #[arg(long, help = "Element-fill expansion radius in pixels (0 disables)")]
    element_fill: Option<u32>,

    #[arg(long, help = "Color regions by severity tier", default_value_t = false)]
    severity_coloring: bool,

    #[arg(long, help = "Backdrop image (baseline or current)")]
    base_image: Option<BaseImage>,

    #[arg(long, help = "Which regions to draw (all, added or removed)")]
    highlight: Option<HighlightMode>,

    #[arg(long, help = "Skip the timestamp overlay", default_value_t = false)]
    no_timestamp: bool,

    #[arg(long, help = "Corner for the timestamp overlay")]
    timestamp_corner: Option<TimestampCorner>,

    #[arg(long, help = "Where to write the diff image (defaults to a timestamp-based name)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Print the statistics record as JSON", default_value_t = false)]
    stats_json: bool,
}

fn build_options(cli: &Cli) -> CompareOptions {
    let mut options = if cli.relaxed {
        CompareOptions::relaxed()
    } else {
        CompareOptions::strict()
    };

    if let Some(algorithm) = cli.algorithm {
        options.algorithm = algorithm;
    }
    if let Some(tolerance) = cli.tolerance {
        options.tolerance = tolerance;
    }
    if let Some(pixel_tolerance) = cli.pixel_tolerance {
        options.pixel_tolerance = pixel_tolerance;
    }
    if let Some(grid_size) = cli.grid_size {
        options.grid_size = grid_size;
    }
    if let Some(diff_mode) = cli.diff_mode {
        options.render.diff_mode = diff_mode;
    }
    if let Some(min_region_area) = cli.min_region_area {
        options.min_region_area = min_region_area;
    }
    if let Some(outline_thickness) = cli.outline_thickness {
        options.render.outline_thickness = outline_thickness;
    }
    if let Some(element_fill) = cli.element_fill {
        options.element_fill = element_fill;
    }
    if cli.severity_coloring {
        options.render.severity_coloring = true;
    }
    if let Some(base_image) = cli.base_image {
        options.render.base_image = base_image;
    }
    if let Some(highlight) = cli.highlight {
        options.render.highlight_mode = highlight;
    }
    if cli.no_timestamp {
        options.render.add_timestamp = false;
    }
    if let Some(corner) = cli.timestamp_corner {
        options.render.timestamp_corner = corner;
    }
    options
}

fn main() -> Result<()> {
    init_logger_exe();

    let cli = Cli::parse();
    let options = build_options(&cli);

    let result = compare(
        ImageSource::Path(cli.baseline.clone()),
        ImageSource::Path(cli.current.clone()),
        &options,
    )?;

    println!("{}", result.summary());

    if let Some(diff) = &result.diff {
        let path = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&diff.suggested_filename));
        diff.image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save diff image to {}: {}", path.display(), e))?;
        log::info!("Saved diff image to {}", path.display());

        let stats = &diff.statistics;
        println!(
            "{} of {} pixels differ ({:.2}%), {} region(s), largest {} px",
            stats.different_pixels,
            stats.total_pixels,
            stats.difference_percentage,
            stats.region_count,
            stats.largest_region_area
        );
        if cli.stats_json {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
    }

    if !result.passed {
        std::process::exit(1);
    }
    Ok(())
}

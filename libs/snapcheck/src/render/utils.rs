use super::types::{BaseImage, Color, DiffMode, HighlightMode, RenderConfig, TimestampCorner};
use crate::common::{get_current_timestamp_str, CompareError, CompareResult};
use crate::mask::{DiffMask, PixelTag};
use crate::regions::{ClassifiedRegion, LabelImage, SeverityTier};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::collections::HashMap;

/// Compose the visual diff for a failed comparison. The output always has
/// the base image's dimensions.
pub fn render_diff(
    baseline: &RgbImage,
    current: &RgbImage,
    mask: &DiffMask,
    labels: &LabelImage,
    regions: &[ClassifiedRegion],
    config: &RenderConfig,
) -> CompareResult<RgbImage> {
    let base = match config.base_image {
        BaseImage::Baseline => baseline,
        BaseImage::Current => current,
    };
    if base.dimensions() != (mask.width, mask.height) {
        return Err(CompareError::Render {
            message: format!(
                "mask is {}x{} but base image is {}x{}",
                mask.width,
                mask.height,
                base.width(),
                base.height()
            ),
        });
    }

    let mut out = base.clone();
    match config.diff_mode {
        DiffMode::Filled => render_filled(&mut out, mask, config),
        DiffMode::Contours => render_contours(&mut out, labels, regions, config),
    }

    if config.add_timestamp {
        stamp_timestamp(&mut out, config);
    }
    Ok(out)
}

fn direction_selected(mode: HighlightMode, direction: PixelTag) -> bool {
    match mode {
        HighlightMode::All => direction != PixelTag::Unchanged,
        HighlightMode::Added => direction == PixelTag::Added,
        HighlightMode::Removed => direction == PixelTag::Removed,
    }
}

/// Legacy mode: recolor each differing pixel solid with the configured
/// severe color. No region grouping, no blending.
fn render_filled(out: &mut RgbImage, mask: &DiffMask, config: &RenderConfig) {
    let color = Rgb(config.severe_color);
    for y in 0..mask.height {
        for x in 0..mask.width {
            if direction_selected(config.highlight_mode, mask.tag(x, y)) {
                out.put_pixel(x, y, color);
            }
        }
    }
}

/// Two-pass compositing: translucent shape fill first, then full-opacity
/// outlines, so the underlying content stays legible.
fn render_contours(
    out: &mut RgbImage,
    labels: &LabelImage,
    regions: &[ClassifiedRegion],
    config: &RenderConfig,
) {
    let selected: Vec<&ClassifiedRegion> = regions
        .iter()
        .filter(|c| direction_selected(config.highlight_mode, c.region.direction))
        .collect();

    let fill_colors: HashMap<u32, Color> = selected
        .iter()
        .map(|c| (c.region.label, severity_color(c.severity, config)))
        .collect();

    // Pass 1: fill each selected region's exact shape.
    for (x, y, label) in labels.enumerate_pixels() {
        if let Some(color) = fill_colors.get(&label[0]) {
            let blended = blend(out.get_pixel(x, y), *color, config.fill_opacity);
            out.put_pixel(x, y, blended);
        }
    }

    // Pass 2: outline each region's bounds at full opacity.
    for classified in &selected {
        let color = Rgb(severity_color(classified.severity, config));
        let b = &classified.region.bounds;
        for t in 0..config.outline_thickness {
            let rect = Rect::at(b.x as i32 - t as i32, b.y as i32 - t as i32)
                .of_size(b.width + 2 * t, b.height + 2 * t);
            draw_hollow_rect_mut(out, rect, color);
        }
    }
}

fn severity_color(severity: SeverityTier, config: &RenderConfig) -> Color {
    if !config.severity_coloring {
        return config.severe_color;
    }
    match severity {
        SeverityTier::Minor => config.minor_color,
        SeverityTier::Moderate => config.moderate_color,
        SeverityTier::Severe => config.severe_color,
    }
}

fn blend(base: &Rgb<u8>, overlay: Color, opacity: f32) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for ch in 0..3 {
        let mixed = f32::from(base[ch]) * (1.0 - opacity) + f32::from(overlay[ch]) * opacity;
        out[ch] = mixed.round() as u8;
    }
    Rgb(out)
}

/// Stamp the current local time into the configured corner, with a one-step
/// drop shadow so the text stays legible on any background.
fn stamp_timestamp(out: &mut RgbImage, config: &RenderConfig) {
    let text = get_current_timestamp_str();
    let scale = (config.timestamp_font_size / GLYPH_HEIGHT).max(1);
    let text_width = text.len() as u32 * (GLYPH_WIDTH + 1) * scale;
    let text_height = GLYPH_HEIGHT * scale;
    let pad = config.timestamp_padding;

    let (width, height) = out.dimensions();
    let x = match config.timestamp_corner {
        TimestampCorner::TopLeft | TimestampCorner::BottomLeft => pad,
        TimestampCorner::TopRight | TimestampCorner::BottomRight => {
            width.saturating_sub(text_width + pad)
        }
    };
    let y = match config.timestamp_corner {
        TimestampCorner::TopLeft | TimestampCorner::TopRight => pad,
        TimestampCorner::BottomLeft | TimestampCorner::BottomRight => {
            height.saturating_sub(text_height + pad)
        }
    };

    draw_label(out, &text, x + scale, y + scale, scale, [0, 0, 0]);
    draw_label(out, &text, x, y, scale, config.timestamp_color);
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

// 5x7 bitmap glyphs for the timestamp character set; each entry is a
// 5-bit row mask, top row first.
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b01110, 0b10001, 0b00001, 0b00110, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b01110, 0b10000, 0b11110, 0b10001, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00001, 0b01110],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ':' => [0b00000, 0b00110, 0b00110, 0b00000, 0b00110, 0b00110, 0b00000],
        ' ' => [0b00000; 7],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

fn draw_label(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Color) {
    let (img_w, img_h) = img.dimensions();
    let mut cursor = x;

    for c in text.chars() {
        let pattern = glyph(c);
        for (row, &bits) in pattern.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = cursor + col * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < img_w && py < img_h {
                            img.put_pixel(px, py, Rgb(color));
                        }
                    }
                }
            }
        }
        cursor += (GLYPH_WIDTH + 1) * scale;
    }
}

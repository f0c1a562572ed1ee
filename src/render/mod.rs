//! Builds the annotated pattern raster: cells, labels, grid, gutters, legend.

pub mod font;
pub mod layout;

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use palette::Srgb;

use crate::catalog::Palette;
use crate::config::PatternConfig;
use crate::error::PatternError;
use layout::{
    Axis, GUTTER_COLOR, LABEL_MIN_BOX, LABEL_PADDING, LEGEND_FONT_FLOOR, LEGEND_FONT_START_MIN,
    RenderLayout,
};

/// File name offered when the raster is downloaded or saved.
pub const EXPORT_FILE_NAME: &str = "pixel_art.png";

/// Canvases beyond this many pixels are refused rather than allocated.
const MAX_CANVAS_PIXELS: u64 = 1 << 28;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Finished pattern image. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRaster {
    image: RgbImage,
}

impl OutputRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Lossless PNG encoding for export.
    pub fn encode_png(&self) -> Result<Vec<u8>, PatternError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| PatternError::Render(format!("PNG encode error: {e}")))?;
        Ok(buf)
    }
}

/// Everything the renderer draws from.
pub struct RenderInput<'a> {
    pub grid_size: u32,
    /// Reduced-palette index per cell, row-major.
    pub indices: &'a [usize],
    pub palette: &'a Palette,
    /// Usage count per reduced-palette entry.
    pub counts: &'a [u32],
    pub config: &'a PatternConfig,
}

/// Scale a float color to 8-bit channels, rounding each `channel · 255`.
pub fn to_rgb8(color: Srgb<f32>) -> Rgb<u8> {
    let c: Srgb<u8> = color.into_format();
    Rgb([c.red, c.green, c.blue])
}

/// White text on dark fills, black otherwise. A channel mean of exactly 128 is "light".
pub fn text_color_for(fill: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = fill.0;
    let mean = (r as f32 + g as f32 + b as f32) / 3.0;
    if mean < 128.0 { WHITE } else { BLACK }
}

/// Largest size in `floor..=start` whose rendered text fits `max_w × max_h`,
/// or `floor` when none does.
pub fn fit_font_size(text: &str, max_w: u32, max_h: u32, start: u32, floor: u32) -> u32 {
    (floor..=start)
        .rev()
        .find(|&size| font::text_width(text, size) <= max_w && size <= max_h)
        .unwrap_or(floor)
}

fn fill_rect(canvas: &mut RgbImage, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    draw_filled_rect_mut(canvas, Rect::at(x as i32, y as i32).of_size(w, h), color);
}

/// Render the pattern described by `input`.
pub fn render(input: &RenderInput<'_>) -> Result<OutputRaster, PatternError> {
    let n = input.grid_size;
    let expected = (n as usize) * (n as usize);
    if input.indices.len() != expected {
        return Err(PatternError::Render(format!(
            "index map has {} cells, expected {expected}",
            input.indices.len()
        )));
    }
    if let Some(&bad) = input.indices.iter().find(|&&i| i >= input.palette.len()) {
        return Err(PatternError::Render(format!(
            "cell references palette entry {bad} of {}",
            input.palette.len()
        )));
    }

    let cfg = input.config;
    let layout = RenderLayout::compute(n, input.palette.len(), cfg)?;
    let (w, h) = (layout.canvas_width, layout.canvas_height);
    if w == 0 || h == 0 || (w as u64) * (h as u64) > MAX_CANVAS_PIXELS {
        return Err(PatternError::Render(format!("cannot allocate a {w}x{h} canvas")));
    }
    tracing::debug!(width = w, height = h, legend = ?cfg.legend_position, "allocating canvas");

    let mut canvas = RgbImage::from_pixel(w, h, WHITE);
    let fills: Vec<Rgb<u8>> = input.palette.entries().iter().map(|e| to_rgb8(e.color)).collect();

    draw_gutters(&mut canvas, &layout);
    draw_cells(&mut canvas, &layout, input, &fills);
    draw_grid_lines(&mut canvas, &layout);
    draw_axis_numbers(&mut canvas, &layout, cfg.font_size.saturating_add(2));
    draw_legend(&mut canvas, &layout, input, &fills);

    Ok(OutputRaster { image: canvas })
}

fn draw_gutters(canvas: &mut RgbImage, layout: &RenderLayout) {
    let (m, g) = (layout.margin, layout.grid_extent);
    // Below the grid, then left of it.
    fill_rect(canvas, 0, (m + g) as i64, m + g, m, GUTTER_COLOR);
    fill_rect(canvas, 0, 0, m, m + g, GUTTER_COLOR);
}

fn draw_cells(canvas: &mut RgbImage, layout: &RenderLayout, input: &RenderInput<'_>, fills: &[Rgb<u8>]) {
    let n = layout.grid_size;
    let cell = layout.cell_size;
    for row in 0..n {
        for col in 0..n {
            let idx = input.indices[(row * n + col) as usize];
            let fill = fills[idx];
            let (x0, y0) = layout.cell_origin(row, col);
            fill_rect(canvas, x0 as i64, y0 as i64, cell, cell, fill);

            if input.config.show_names && fill != WHITE {
                let name = &input.palette.entries()[idx].name;
                font::draw_text_centered(
                    canvas,
                    name,
                    x0 as f32 + cell as f32 / 2.0,
                    y0 as f32 + cell as f32 / 2.0,
                    input.config.font_size,
                    text_color_for(fill),
                );
            }
        }
    }
}

fn draw_grid_lines(canvas: &mut RgbImage, layout: &RenderLayout) {
    let start = layout.margin as i64;
    for line in layout.grid_lines() {
        let half = (line.weight / 2) as i64;
        let across = line.offset as i64 - half;
        let along = start - half;
        let length = layout.grid_extent + line.weight;
        match line.axis {
            Axis::Vertical => fill_rect(canvas, across, along, line.weight, length, BLACK),
            Axis::Horizontal => fill_rect(canvas, along, across, length, line.weight, BLACK),
        }
    }
}

fn draw_axis_numbers(canvas: &mut RgbImage, layout: &RenderLayout, size: u32) {
    let m = layout.margin as f32;
    let cell = layout.cell_size as f32;
    let bottom_band = (layout.margin + layout.grid_extent) as f32 + m / 2.0;
    for i in 1..=layout.grid_size {
        let label = i.to_string();
        let center = m + (i - 1) as f32 * cell + cell / 2.0;
        font::draw_text_centered(canvas, &label, m / 2.0, center, size, WHITE);
        font::draw_text_centered(canvas, &label, center, bottom_band, size, WHITE);
    }
}

fn draw_legend(canvas: &mut RgbImage, layout: &RenderLayout, input: &RenderInput<'_>, fills: &[Rgb<u8>]) {
    let (sw, sh) = (layout.legend.swatch_width, layout.legend.swatch_height);
    let max_w = sw.saturating_sub(2 * LABEL_PADDING).max(LABEL_MIN_BOX);
    let max_h = sh.saturating_sub(2 * LABEL_PADDING).max(LABEL_MIN_BOX);
    let start = LEGEND_FONT_START_MIN.max(input.config.font_size.saturating_add(2));

    for (idx, entry) in input.palette.entries().iter().enumerate() {
        let (x0, y0) = layout.swatch_origin(idx);
        let fill = fills[idx];
        fill_rect(canvas, x0 as i64, y0 as i64, sw, sh, fill);
        draw_hollow_rect_mut(canvas, Rect::at(x0 as i32, y0 as i32).of_size(sw, sh), BLACK);

        if input.config.show_names {
            let count = input.counts.get(idx).copied().unwrap_or(0);
            let text = format!("{} ({count})", entry.name);
            let size = fit_font_size(&text, max_w, max_h, start, LEGEND_FONT_FLOOR);
            font::draw_text_centered(
                canvas,
                &text,
                x0 as f32 + sw as f32 / 2.0,
                y0 as f32 + sh as f32 / 2.0,
                size,
                text_color_for(fill),
            );
        }
    }
}

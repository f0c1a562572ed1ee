//! Output geometry: canvas size, grid placement, legend grid and stroke plan.
//!
//! Everything here is a pure function of the grid size, the reduced palette
//! length and the [`PatternConfig`]; nothing touches pixels.

use image::Rgb;

use crate::config::{LegendPosition, PatternConfig};
use crate::error::PatternError;

/// Fill of the coordinate gutters left of and below the grid.
pub const GUTTER_COLOR: Rgb<u8> = Rgb([17, 112, 189]);

/// Every `HEAVY_LINE_EVERY`th grid line (counting from 0) uses the heavy stroke.
pub const HEAVY_LINE_EVERY: u32 = 5;
pub const LIGHT_STROKE: u32 = 1;
pub const HEAVY_STROKE: u32 = 3;

/// Added to `N` before dividing the grid height or width into legend rows or columns.
pub const GRID_SPAN_ALLOWANCE: f32 = 1.5;
/// Right layout: one legend row per this many cells of grid height.
pub const RIGHT_ROW_SPAN: f32 = 1.5;
/// Right layout: blank space before and after the legend block, in cells.
pub const RIGHT_LEGEND_PADDING: f32 = 0.6;

// Bottom layout heuristics, all in cell units.
pub const BOTTOM_COLUMN_PITCH: f32 = 3.5;
pub const BOTTOM_ROW_PITCH: f32 = 1.5;
pub const BOTTOM_SWATCH_WIDTH: f32 = 3.0;
pub const BOTTOM_SWATCH_HEIGHT: f32 = 1.0;
/// Distance from the bottom of the grid to the first legend row.
pub const BOTTOM_LEGEND_OFFSET: f32 = 1.5;
/// Space reserved between the grid and the legend rows (gutter included).
pub const BOTTOM_EXTRA_HEIGHT: f32 = 2.5;

/// Inner padding of a swatch when fitting its label.
pub const LABEL_PADDING: u32 = 4;
/// Smallest label box considered, however small the swatch.
pub const LABEL_MIN_BOX: u32 = 10;
/// Legend labels never shrink below this size.
pub const LEGEND_FONT_FLOOR: u32 = 8;
/// Legend labels start their fit search at `max(this, font_size + 2)`.
pub const LEGEND_FONT_START_MIN: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// One grid line: its position along the perpendicular axis and its stroke width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLine {
    pub axis: Axis,
    pub offset: u32,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendLayout {
    pub position: LegendPosition,
    pub rows: u32,
    pub columns: u32,
    pub origin: (u32, u32),
    pub pitch_x: u32,
    pub pitch_y: u32,
    pub swatch_width: u32,
    pub swatch_height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderLayout {
    pub grid_size: u32,
    pub cell_size: u32,
    /// Width of the gutters, also the blank band above the grid.
    pub margin: u32,
    /// Edge length of the grid itself (`N · cell`).
    pub grid_extent: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub legend: LegendLayout,
}

#[inline]
fn cells(ratio: f32, cell: u32) -> u64 {
    (ratio * cell as f32).round() as u64
}

/// Narrow a `u64` extent back to pixel coordinates.
fn narrow(value: u64, what: &str) -> Result<u32, PatternError> {
    u32::try_from(value)
        .map_err(|_| PatternError::Render(format!("{what} of {value} px is out of range")))
}

impl RenderLayout {
    /// Geometry for an `N × N` grid and a legend of `palette_len` entries.
    ///
    /// Extents are summed in `u64` with saturation and must fit `u32`, so
    /// oversized cells or ratios are a [`PatternError::Render`].
    pub fn compute(
        grid_size: u32,
        palette_len: usize,
        config: &PatternConfig,
    ) -> Result<Self, PatternError> {
        let cell = config.cell_size;
        let margin = u64::from(cell);
        let grid_extent = u64::from(grid_size).saturating_mul(u64::from(cell));
        let entries = palette_len.max(1) as u64;
        let n = grid_size as f32;

        let (legend, canvas_width, canvas_height) = match config.legend_position {
            LegendPosition::Right => {
                let rows = (((n + GRID_SPAN_ALLOWANCE) / RIGHT_ROW_SPAN).floor() as u64).max(1);
                let columns = entries.div_ceil(rows);
                let swatch_width = cells(config.swatch_width_ratio, cell).max(1);
                let swatch_height = cells(config.swatch_height_ratio, cell).max(1);
                let pitch_x = swatch_width.saturating_add(cells(config.gap_x_ratio, cell));
                let pitch_y = swatch_height.saturating_add(cells(config.gap_y_ratio, cell));
                let padding = cells(RIGHT_LEGEND_PADDING, cell);

                let legend_x = margin.saturating_add(grid_extent).saturating_add(padding);
                let width = legend_x
                    .saturating_add(columns.saturating_mul(pitch_x))
                    .saturating_add(padding);
                let height = grid_extent.saturating_add(2 * margin);
                let legend = LegendLayout {
                    position: LegendPosition::Right,
                    rows: narrow(rows, "legend row count")?,
                    columns: narrow(columns, "legend column count")?,
                    origin: (narrow(legend_x, "legend offset")?, narrow(margin, "margin")?),
                    pitch_x: narrow(pitch_x, "legend column pitch")?,
                    pitch_y: narrow(pitch_y, "legend row pitch")?,
                    swatch_width: narrow(swatch_width, "swatch width")?,
                    swatch_height: narrow(swatch_height, "swatch height")?,
                };
                (legend, width, height)
            }
            LegendPosition::Bottom => {
                let columns =
                    (((n + GRID_SPAN_ALLOWANCE) / BOTTOM_COLUMN_PITCH).floor() as u64).max(1);
                let rows = entries.div_ceil(columns);
                let pitch_y = cells(BOTTOM_ROW_PITCH, cell);

                let legend_y = margin
                    .saturating_add(grid_extent)
                    .saturating_add(cells(BOTTOM_LEGEND_OFFSET, cell));
                let width = grid_extent.saturating_add(margin).saturating_add(u64::from(cell));
                let height = margin
                    .saturating_add(grid_extent)
                    .saturating_add(cells(BOTTOM_EXTRA_HEIGHT, cell))
                    .saturating_add(rows.saturating_mul(pitch_y));
                let legend = LegendLayout {
                    position: LegendPosition::Bottom,
                    rows: narrow(rows, "legend row count")?,
                    columns: narrow(columns, "legend column count")?,
                    origin: (0, narrow(legend_y, "legend offset")?),
                    pitch_x: narrow(cells(BOTTOM_COLUMN_PITCH, cell), "legend column pitch")?,
                    pitch_y: narrow(pitch_y, "legend row pitch")?,
                    swatch_width: narrow(cells(BOTTOM_SWATCH_WIDTH, cell).max(1), "swatch width")?,
                    swatch_height: narrow(cells(BOTTOM_SWATCH_HEIGHT, cell).max(1), "swatch height")?,
                };
                (legend, width, height)
            }
        };

        Ok(Self {
            grid_size,
            cell_size: cell,
            margin: cell,
            grid_extent: narrow(grid_extent, "grid extent")?,
            canvas_width: narrow(canvas_width, "canvas width")?,
            canvas_height: narrow(canvas_height, "canvas height")?,
            legend,
        })
    }

    /// Top-left pixel of grid cell `(row, col)`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (
            self.margin + col * self.cell_size,
            self.margin + row * self.cell_size,
        )
    }

    /// Top-left pixel of legend swatch `index`.
    ///
    /// The right legend fills column by column, the bottom legend row by row.
    pub fn swatch_origin(&self, index: usize) -> (u32, u32) {
        let l = &self.legend;
        let index = index as u32;
        let (row, col) = match l.position {
            LegendPosition::Right => (index % l.rows, index / l.rows),
            LegendPosition::Bottom => (index / l.columns, index % l.columns),
        };
        (l.origin.0 + col * l.pitch_x, l.origin.1 + row * l.pitch_y)
    }

    /// `N + 1` vertical then `N + 1` horizontal lines across the grid bounds.
    pub fn grid_lines(&self) -> Vec<GridLine> {
        let weight = |k: u32| {
            if k % HEAVY_LINE_EVERY == 0 {
                HEAVY_STROKE
            } else {
                LIGHT_STROKE
            }
        };
        let line = |axis, k| GridLine {
            axis,
            offset: self.margin + k * self.cell_size,
            weight: weight(k),
        };
        (0..=self.grid_size)
            .map(|k| line(Axis::Vertical, k))
            .chain((0..=self.grid_size).map(|k| line(Axis::Horizontal, k)))
            .collect()
    }
}

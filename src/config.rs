use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Where the color legend is placed relative to the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    /// Swatches fill columns to the right of the grid, top to bottom.
    #[default]
    Right,
    /// Swatches fill rows below the grid, left to right.
    Bottom,
}

impl std::str::FromStr for LegendPosition {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" => Ok(LegendPosition::Right),
            "bottom" => Ok(LegendPosition::Bottom),
            other => Err(PatternError::InvalidConfig(format!(
                "unknown legend position `{other}` (expected `right` or `bottom`)"
            ))),
        }
    }
}

/// Largest accepted cell edge, in pixels.
pub const MAX_CELL_SIZE: u32 = 4096;
/// Largest accepted base font size, in pixels.
pub const MAX_FONT_SIZE: u32 = 512;

/// Knobs for one pattern run.
///
/// Field names serialize in camelCase so a browser front-end can pass the same
/// JSON object it reads from its form controls. Missing fields fall back to
/// [`PatternConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternConfig {
    /// Grid resolution `N`; the output has `N × N` cells.
    pub grid_size: u32,
    /// Upper bound `K` on the number of colors kept after the first match.
    pub max_colors: usize,
    /// Draw palette names in cells and legend swatches.
    pub show_names: bool,
    /// Base label font size in pixels.
    pub font_size: u32,
    /// Edge length of one grid cell in pixels.
    pub cell_size: u32,
    pub legend_position: LegendPosition,
    /// Legend swatch width, in multiples of `cell_size` (right layout).
    pub swatch_width_ratio: f32,
    /// Legend swatch height, in multiples of `cell_size` (right layout).
    pub swatch_height_ratio: f32,
    /// Horizontal gap between swatch columns, in multiples of `cell_size`.
    pub gap_x_ratio: f32,
    /// Vertical gap between swatch rows, in multiples of `cell_size`.
    pub gap_y_ratio: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            max_colors: 16,
            show_names: true,
            font_size: 10,
            cell_size: 24,
            legend_position: LegendPosition::Right,
            swatch_width_ratio: 3.0,
            swatch_height_ratio: 1.0,
            gap_x_ratio: 0.3,
            gap_y_ratio: 0.2,
        }
    }
}

impl PatternConfig {
    /// Parse a (possibly partial) JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        serde_json::from_str(json)
            .map_err(|e| PatternError::InvalidConfig(format!("config JSON: {e}")))
    }

    /// Reject values the sampler or renderer cannot work with.
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.grid_size == 0 {
            return Err(invalid("grid size must be at least 1"));
        }
        if self.max_colors == 0 {
            return Err(invalid("max colors must be at least 1"));
        }
        if !(1..=MAX_CELL_SIZE).contains(&self.cell_size) {
            return Err(invalid(&format!(
                "cell size must be 1..={MAX_CELL_SIZE} px, got {}",
                self.cell_size
            )));
        }
        if !(1..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(invalid(&format!(
                "font size must be 1..={MAX_FONT_SIZE} px, got {}",
                self.font_size
            )));
        }
        let ratios = [
            ("swatch width ratio", self.swatch_width_ratio, false),
            ("swatch height ratio", self.swatch_height_ratio, false),
            ("gap x ratio", self.gap_x_ratio, true),
            ("gap y ratio", self.gap_y_ratio, true),
        ];
        for (name, value, zero_ok) in ratios {
            let in_range = if zero_ok { value >= 0.0 } else { value > 0.0 };
            if !value.is_finite() || !in_range {
                return Err(invalid(&format!("{name} is out of range: {value}")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> PatternError {
    PatternError::InvalidConfig(msg.to_string())
}

//! Nearest-color lookup against a candidate palette.

use palette::Srgb;

use crate::sampler::SampleGrid;

/// Palette index chosen for every grid cell, row-major like [`SampleGrid`].
pub type PaletteIndexMap = Vec<usize>;

/// Maps a color to the index of the closest candidate.
///
/// Implementations must break ties toward the lowest index so results stay
/// identical whichever lookup structure is used.
pub trait NearestColor {
    fn nearest_index(&self, color: Srgb<f32>) -> usize;
}

/// Exhaustive squared-Euclidean search in RGB. `O(len)` per query.
pub struct LinearMatcher<'a> {
    candidates: &'a [Srgb<f32>],
}

impl<'a> LinearMatcher<'a> {
    pub fn new(candidates: &'a [Srgb<f32>]) -> Self {
        Self { candidates }
    }
}

#[inline(always)]
fn distance_sq(a: Srgb<f32>, b: Srgb<f32>) -> f32 {
    let dr = a.red - b.red;
    let dg = a.green - b.green;
    let db = a.blue - b.blue;
    dr * dr + dg * dg + db * db
}

impl NearestColor for LinearMatcher<'_> {
    fn nearest_index(&self, color: Srgb<f32>) -> usize {
        let mut best_idx = 0;
        let mut best_dist = f32::INFINITY;
        for (idx, &c) in self.candidates.iter().enumerate() {
            let dist = distance_sq(color, c);
            // Strict: the first of equally distant candidates wins.
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }
        best_idx
    }
}

/// Match every cell of `grid`.
pub fn match_all(grid: &SampleGrid, matcher: &impl NearestColor) -> PaletteIndexMap {
    grid.cells().iter().map(|&c| matcher.nearest_index(c)).collect()
}

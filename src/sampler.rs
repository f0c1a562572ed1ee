//! Square cropping and block-average downsampling of the input bitmap.

use image::{RgbaImage, imageops};
use palette::Srgb;

use crate::error::PatternError;

/// Alpha (as a 0..1 fraction) below which a pixel counts as white paper.
const TRANSPARENT_ALPHA: f32 = 0.5;

/// Centered square cut of the input image.
#[derive(Clone, Debug)]
pub struct SquareCrop(RgbaImage);

/// Square whose side is an exact multiple of the grid size.
#[derive(Clone, Debug)]
pub struct DivisibleCrop(RgbaImage);

impl SquareCrop {
    pub fn side(&self) -> u32 {
        self.0.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

impl DivisibleCrop {
    pub fn side(&self) -> u32 {
        self.0.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

/// `N × N` averaged colors, row-major (`index = row * N + col`).
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    size: u32,
    cells: Vec<Srgb<f32>>,
}

impl SampleGrid {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cells(&self) -> &[Srgb<f32>] {
        &self.cells
    }

    pub fn get(&self, row: u32, col: u32) -> Srgb<f32> {
        self.cells[(row * self.size + col) as usize]
    }
}

/// Cut the largest centered square out of `image`.
pub fn center_crop_square(image: &RgbaImage) -> SquareCrop {
    let (w, h) = image.dimensions();
    let side = w.min(h);
    let left = (w - side) / 2;
    let top = (h - side) / 2;
    SquareCrop(imageops::crop_imm(image, left, top, side, side).to_image())
}

/// Keep the top-left `side - side % n` square.
///
/// The trim is not re-centered, so up to `n - 1` pixels come off the right and
/// bottom edges only.
pub fn trim_to_divisible(square: SquareCrop, n: u32) -> DivisibleCrop {
    let side = square.side();
    let trimmed = side - side % n;
    if trimmed == side {
        return DivisibleCrop(square.0);
    }
    DivisibleCrop(imageops::crop_imm(&square.0, 0, 0, trimmed, trimmed).to_image())
}

/// Average each of the `n × n` blocks of `crop` into one color.
///
/// Block `(i, j)` covers rows `floor(i·bs)..floor((i+1)·bs)` and the same
/// column range, with `bs = side / n` as a float. Pixels with alpha below one
/// half are averaged in as pure white.
pub fn block_average(crop: &DivisibleCrop, n: u32) -> SampleGrid {
    let img = crop.image();
    let bs = crop.side() as f64 / n as f64;
    let mut cells = Vec::with_capacity((n * n) as usize);

    for i in 0..n {
        let y0 = (i as f64 * bs).floor() as u32;
        let y1 = ((i + 1) as f64 * bs).floor() as u32;
        for j in 0..n {
            let x0 = (j as f64 * bs).floor() as u32;
            let x1 = ((j + 1) as f64 * bs).floor() as u32;

            let mut sum = [0f64; 3];
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    let [r, g, b, a] = img.get_pixel(x, y).0;
                    let rgb = if (a as f32 / 255.0) < TRANSPARENT_ALPHA {
                        [1.0, 1.0, 1.0]
                    } else {
                        [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
                    };
                    sum[0] += rgb[0];
                    sum[1] += rgb[1];
                    sum[2] += rgb[2];
                    count += 1;
                }
            }

            let count = count.max(1) as f64;
            cells.push(Srgb::new(
                (sum[0] / count) as f32,
                (sum[1] / count) as f32,
                (sum[2] / count) as f32,
            ));
        }
    }

    SampleGrid { size: n, cells }
}

/// Crop, trim and average `image` down to an `n × n` grid.
pub fn sample(image: &RgbaImage, n: u32) -> Result<SampleGrid, PatternError> {
    if n == 0 {
        return Err(PatternError::InvalidConfig("grid size must be at least 1".into()));
    }
    let square = center_crop_square(image);
    if square.side() < n {
        return Err(PatternError::ImageTooSmall {
            side: square.side(),
            grid_size: n,
        });
    }
    let crop = trim_to_divisible(square, n);
    tracing::debug!(side = crop.side(), grid_size = n, "sampling crop");
    Ok(block_average(&crop, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn landscape_crop_is_centered() {
        let mut img = solid(100, 60, [0, 0, 0, 255]);
        // Mark the first column that survives the crop.
        for y in 0..60 {
            img.put_pixel(20, y, Rgba([255, 0, 0, 255]));
        }
        let sq = center_crop_square(&img);
        assert_eq!(sq.side(), 60);
        assert_eq!(sq.image().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn portrait_crop_is_centered() {
        let sq = center_crop_square(&solid(31, 50, [9, 9, 9, 255]));
        assert_eq!(sq.side(), 31);
    }

    #[test]
    fn divisible_side_is_untouched() {
        let crop = trim_to_divisible(center_crop_square(&solid(100, 60, [0; 4])), 4);
        assert_eq!(crop.side(), 60);
    }

    #[test]
    fn trim_keeps_top_left() {
        let mut img = solid(10, 10, [0, 0, 0, 255]);
        img.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
        let crop = trim_to_divisible(center_crop_square(&img), 3);
        assert_eq!(crop.side(), 9);
        assert_eq!(crop.image().get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn trimmed_side_is_always_a_multiple() {
        for side in 1..40u32 {
            for n in 1..=side {
                let crop = trim_to_divisible(center_crop_square(&solid(side, side + 3, [0; 4])), n);
                assert_eq!(crop.side() % n, 0);
                assert!(crop.side() <= side);
            }
        }
    }

    #[test]
    fn sampling_yields_n_squared_cells() {
        for n in [1u32, 2, 3, 7, 16] {
            let grid = sample(&solid(50, 33, [10, 20, 30, 255]), n).unwrap();
            assert_eq!(grid.cells().len(), (n * n) as usize);
            assert_eq!(grid.size(), n);
        }
    }

    #[test]
    fn transparent_block_averages_to_white() {
        let grid = sample(&solid(8, 8, [12, 34, 56, 0]), 2).unwrap();
        for c in grid.cells() {
            assert_eq!(*c, Srgb::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn half_transparent_block_is_mixed_with_white() {
        let mut img = solid(2, 2, [0, 0, 0, 255]);
        img.put_pixel(1, 0, Rgba([0, 0, 0, 127]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 127]));
        let grid = sample(&img, 1).unwrap();
        let c = grid.get(0, 0);
        assert!((c.red - 0.5).abs() < 1e-6);
        assert!((c.blue - 0.5).abs() < 1e-6);
    }

    #[test]
    fn alpha_128_counts_as_opaque() {
        let grid = sample(&solid(2, 2, [0, 0, 0, 128]), 1).unwrap();
        assert_eq!(grid.get(0, 0), Srgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn blocks_average_their_own_pixels() {
        let mut img = solid(4, 4, [0, 0, 0, 255]);
        for y in 0..2 {
            for x in 2..4 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let grid = sample(&img, 2).unwrap();
        assert_eq!(grid.get(0, 0), Srgb::new(0.0, 0.0, 0.0));
        assert_eq!(grid.get(0, 1), Srgb::new(1.0, 1.0, 1.0));
        assert_eq!(grid.get(1, 1), Srgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn image_smaller_than_grid_is_rejected() {
        let err = sample(&solid(3, 10, [0; 4]), 4).unwrap_err();
        assert!(matches!(err, PatternError::ImageTooSmall { side: 3, grid_size: 4 }));
    }
}

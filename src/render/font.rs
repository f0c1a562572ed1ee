//! Embedded 5×7 bitmap font used for every label in the output raster.
//!
//! Glyphs are scaled by `size / 8` with nearest-neighbour sampling, so output
//! is identical on every platform and no font files are needed. Lowercase
//! letters reuse the uppercase glyphs; anything else outside the table is
//! drawn as a hollow box.

use image::{Rgb, RgbImage};

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Horizontal advance per character, in glyph units (glyph plus one column of spacing).
const ADVANCE: u32 = 6;
/// Glyph units per em; a `size` px font maps one unit to `size / EM` px.
const EM: f32 = 8.0;

const MISSING: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

#[rustfmt::skip]
const GLYPHS: &[(char, [u8; 7])] = &[
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('#', [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('+', [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    ('/', [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    ('A', [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F]),
];

fn glyph(c: char) -> &'static [u8; 7] {
    let c = c.to_ascii_uppercase();
    GLYPHS
        .binary_search_by_key(&c, |&(k, _)| k)
        .map(|i| &GLYPHS[i].1)
        .unwrap_or(&MISSING)
}

#[inline]
fn unit(size: u32) -> f32 {
    size as f32 / EM
}

/// Rendered width of `text` at `size` px.
pub fn text_width(text: &str, size: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    ((n * ADVANCE - 1) as f32 * unit(size)).round() as u32
}

/// Rendered ink height of a line at `size` px.
pub fn text_height(size: u32) -> u32 {
    (GLYPH_H as f32 * unit(size)).round().max(1.0) as u32
}

/// Visit every inked pixel of `text` with its top-left corner at `(x, y)`.
pub fn for_each_pixel(text: &str, x: i64, y: i64, size: u32, mut plot: impl FnMut(i64, i64)) {
    let u = unit(size);
    let gw = (GLYPH_W as f32 * u).round().max(1.0) as u32;
    let gh = text_height(size);

    for (n, c) in text.chars().enumerate() {
        let rows = glyph(c);
        let ox = x + (n as f32 * ADVANCE as f32 * u).round() as i64;
        for py in 0..gh {
            let bits = rows[(py * GLYPH_H / gh) as usize];
            for px in 0..gw {
                let col = px * GLYPH_W / gw;
                if bits & (0x10 >> col) != 0 {
                    plot(ox + px as i64, y + py as i64);
                }
            }
        }
    }
}

/// Draw `text` onto `canvas`, clipping at the edges.
pub fn draw_text(canvas: &mut RgbImage, text: &str, x: i64, y: i64, size: u32, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    for_each_pixel(text, x, y, size, |px, py| {
        if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    });
}

/// Draw `text` centered on `(cx, cy)`.
pub fn draw_text_centered(
    canvas: &mut RgbImage,
    text: &str,
    cx: f32,
    cy: f32,
    size: u32,
    color: Rgb<u8>,
) {
    let x = (cx - text_width(text, size) as f32 / 2.0).round() as i64;
    let y = (cy - text_height(size) as f32 / 2.0).round() as i64;
    draw_text(canvas, text, x, y, size, color);
}

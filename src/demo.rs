//! Built-in sample input for trying the pipeline without a photo at hand.

use image::{Rgba, RgbaImage};
use palette::Srgb;

use crate::render::font;

pub const DEMO_WIDTH: u32 = 480;
pub const DEMO_HEIGHT: u32 = 320;

const STOPS: [(f32, Srgb<u8>); 3] = [
    (0.0, Srgb::new(0xff, 0x6a, 0x00)),
    (0.5, Srgb::new(0x00, 0xd4, 0xff)),
    (1.0, Srgb::new(0x7f, 0xff, 0x00)),
];

const CAPTION: &str = "DEMO";
const CAPTION_SIZE: u32 = 48;
const CAPTION_X: i64 = 30;
const CAPTION_BASELINE: i64 = 80;
/// Opacity of the black caption over the gradient.
const CAPTION_ALPHA: f32 = 0.15;

fn gradient_at(t: f32) -> Srgb<f32> {
    let t = t.clamp(0.0, 1.0);
    for pair in STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let (a, b): (Srgb<f32>, Srgb<f32>) = (c0.into_format(), c1.into_format());
            return Srgb::new(
                a.red + (b.red - a.red) * f,
                a.green + (b.green - a.green) * f,
                a.blue + (b.blue - a.blue) * f,
            );
        }
    }
    STOPS[STOPS.len() - 1].1.into_format()
}

/// Diagonal three-stop gradient with a faint "DEMO" caption.
pub fn gradient_demo() -> RgbaImage {
    let (w, h) = (DEMO_WIDTH as f32, DEMO_HEIGHT as f32);
    let len_sq = w * w + h * h;

    let mut image = RgbaImage::from_fn(DEMO_WIDTH, DEMO_HEIGHT, |x, y| {
        // Project the pixel center onto the (0,0)→(w,h) axis.
        let t = ((x as f32 + 0.5) * w + (y as f32 + 0.5) * h) / len_sq;
        let c: Srgb<u8> = gradient_at(t).into_format();
        Rgba([c.red, c.green, c.blue, 255])
    });

    let top = CAPTION_BASELINE - font::text_height(CAPTION_SIZE) as i64;
    font::for_each_pixel(CAPTION, CAPTION_X, top, CAPTION_SIZE, |x, y| {
        if x < 0 || y < 0 || x >= DEMO_WIDTH as i64 || y >= DEMO_HEIGHT as i64 {
            return;
        }
        let px = image.get_pixel_mut(x as u32, y as u32);
        for ch in &mut px.0[..3] {
            *ch = (*ch as f32 * (1.0 - CAPTION_ALPHA)).round() as u8;
        }
    });

    image
}

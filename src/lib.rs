//! Turn any raster image into a bead / cross-stitch style pattern: an `N × N`
//! grid of named palette colors, numbered along two edges, with a legend
//! listing how many cells use each color.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod config;
pub mod demo;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod reducer;
pub mod render;
pub mod sampler;

pub use catalog::{Palette, PaletteEntry, PaletteJson, PaletteSource};
#[cfg(not(target_arch = "wasm32"))]
pub use catalog::PaletteFile;
pub use config::{LegendPosition, PatternConfig};
pub use error::{PaletteError, PatternError};
pub use pipeline::{PatternOutput, Session, Stage, generate};
pub use render::{EXPORT_FILE_NAME, OutputRaster};

fn js_err(e: PatternError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<PatternConfig, JsValue> {
    match config_json {
        Some(json) => PatternConfig::from_json(&json).map_err(js_err),
        None => Ok(PatternConfig::default()),
    }
}

/// `{ image: Uint8Array (PNG), fileName, names: string[], counts: number[] }`
fn output_to_js(output: &PatternOutput) -> Result<Object, JsValue> {
    let names = Array::new();
    let counts = Array::new();
    for (entry, count) in output.palette.entries().iter().zip(&output.counts) {
        names.push(&JsValue::from_str(&entry.name));
        counts.push(&JsValue::from(*count));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &Uint8Array::from(output.png.as_slice()))?;
    Reflect::set(&result, &JsValue::from_str("fileName"), &JsValue::from_str(EXPORT_FILE_NAME))?;
    Reflect::set(&result, &JsValue::from_str("names"), &names)?;
    Reflect::set(&result, &JsValue::from_str("counts"), &counts)?;
    Ok(result)
}

/// One-shot conversion: encoded image bytes plus palette JSON in, PNG pattern out.
///
/// `config_json` is a (possibly partial) camelCase [`PatternConfig`] object.
#[wasm_bindgen(js_name = pixelatePattern)]
pub fn pixelate_pattern(
    input: Vec<u8>,
    palette_json: String,
    config_json: Option<String>,
) -> Result<Object, JsValue> {
    let config = parse_config(config_json)?;
    let image = image::load_from_memory(&input)
        .map_err(|e| js_err(e.into()))?
        .to_rgba8();
    let palette = Palette::from_json(palette_json.as_bytes())
        .map_err(|e| js_err(PatternError::ResourceLoad(e)))?;

    let output = generate(&image, &palette, &config).map_err(js_err)?;
    output_to_js(&output)
}

/// Stateful handle for a page: holds the current image and the last pattern.
#[wasm_bindgen]
pub struct PatternSession {
    inner: Session,
}

impl Default for PatternSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PatternSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { inner: Session::new() }
    }

    #[wasm_bindgen(js_name = loadImage)]
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.load_image_bytes(bytes).map_err(js_err)
    }

    /// Use the built-in gradient as input.
    #[wasm_bindgen(js_name = loadDemo)]
    pub fn load_demo(&mut self) -> Result<(), JsValue> {
        self.inner.set_image(demo::gradient_demo()).map_err(js_err)
    }

    /// Run the pipeline against `palette_json` (the fetched palette resource).
    pub fn run(&mut self, palette_json: &str, config_json: Option<String>) -> Result<Object, JsValue> {
        let config = parse_config(config_json)?;
        let output = self
            .inner
            .run(&PaletteJson(palette_json.as_bytes()), &config)
            .map_err(js_err)?;
        output_to_js(output)
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }

    pub fn stage(&self) -> String {
        self.inner.stage().as_str().to_string()
    }

    /// PNG bytes of the last successful pattern, for download.
    #[wasm_bindgen(js_name = downloadBytes)]
    pub fn download_bytes(&self) -> Option<Vec<u8>> {
        self.inner.export_png().map(<[u8]>::to_vec)
    }

    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name(&self) -> String {
        EXPORT_FILE_NAME.to_string()
    }
}

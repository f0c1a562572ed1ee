//! Named color palettes loaded from the `{ "rgb": [...], "name": [...] }` resource.

use palette::Srgb;
use serde::Deserialize;

use crate::error::{PaletteError, PatternError};

/// One reference color and the label printed for it (bead code, thread number, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteEntry {
    pub color: Srgb<f32>,
    pub name: String,
}

/// Ordered, immutable list of named colors. An entry's index is its position.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

/// Palette names are usually strings but some bead catalogs store plain numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum NameValue {
    Text(String),
    Number(serde_json::Number),
}

impl From<NameValue> for String {
    fn from(value: NameValue) -> Self {
        match value {
            NameValue::Text(s) => s,
            NameValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct PaletteDocument {
    rgb: Vec<[f32; 3]>,
    name: Vec<NameValue>,
}

impl Palette {
    /// Build a palette from already-paired entries.
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self, PaletteError> {
        if entries.is_empty() {
            return Err(PaletteError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            let (r, g, b) = entry.color.into_components();
            if !(r.is_finite() && g.is_finite() && b.is_finite()) {
                return Err(PaletteError::NonFiniteComponent { index });
            }
        }
        Ok(Self { entries })
    }

    /// Parse the JSON palette resource. `rgb` and `name` must be index-aligned.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PaletteError> {
        let doc: PaletteDocument = serde_json::from_slice(bytes)?;
        if doc.rgb.len() != doc.name.len() {
            return Err(PaletteError::LengthMismatch {
                rgb: doc.rgb.len(),
                name: doc.name.len(),
            });
        }
        let entries = doc
            .rgb
            .into_iter()
            .zip(doc.name)
            .map(|([r, g, b], name)| PaletteEntry {
                color: Srgb::new(r, g, b),
                name: name.into(),
            })
            .collect();
        Self::new(entries)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, PaletteError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// Colors in palette order, for the matcher.
    pub fn colors(&self) -> Vec<Srgb<f32>> {
        self.entries.iter().map(|e| e.color).collect()
    }

    /// New palette holding the entries at `indices`, in the order given.
    ///
    /// Out-of-range indices are skipped; an empty selection is an error since
    /// nothing could be matched against it.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, PaletteError> {
        let entries = indices
            .iter()
            .filter_map(|&i| self.entries.get(i).cloned())
            .collect();
        Self::new(entries)
    }
}

/// Where the Loading stage obtains its palette.
pub trait PaletteSource {
    fn load_palette(&self) -> Result<Palette, PatternError>;
}

impl PaletteSource for Palette {
    fn load_palette(&self) -> Result<Palette, PatternError> {
        Ok(self.clone())
    }
}

/// JSON palette resource held in memory (e.g. the body of a fetch).
pub struct PaletteJson<'a>(pub &'a [u8]);

impl PaletteSource for PaletteJson<'_> {
    fn load_palette(&self) -> Result<Palette, PatternError> {
        Ok(Palette::from_json(self.0)?)
    }
}

/// JSON palette resource read from disk on every run.
#[cfg(not(target_arch = "wasm32"))]
pub struct PaletteFile(pub std::path::PathBuf);

#[cfg(not(target_arch = "wasm32"))]
impl PaletteSource for PaletteFile {
    fn load_palette(&self) -> Result<Palette, PatternError> {
        Ok(Palette::from_path(&self.0)?)
    }
}

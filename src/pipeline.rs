//! Runs sampling, two-pass matching, reduction and rendering in order.
//!
//! [`generate`] is the whole computation as a pure function. [`Session`] wraps
//! it with the state a front-end needs: the current input image, the last good
//! output and the stage of the run in flight.

use image::RgbaImage;

use crate::catalog::{Palette, PaletteSource};
use crate::config::PatternConfig;
use crate::error::PatternError;
use crate::matcher::{LinearMatcher, PaletteIndexMap, match_all};
use crate::reducer::{ColorCounts, count_occurrences, select_top_k};
use crate::render::{self, OutputRaster, RenderInput};
use crate::sampler;

/// Where a run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Sampling,
    FirstMatch,
    Reducing,
    SecondMatch,
    Rendering,
    Done,
    Error,
}

impl Stage {
    /// True from `Loading` through `Rendering`.
    pub fn is_busy(self) -> bool {
        !matches!(self, Stage::Idle | Stage::Done | Stage::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Loading => "loading",
            Stage::Sampling => "sampling",
            Stage::FirstMatch => "first-match",
            Stage::Reducing => "reducing",
            Stage::SecondMatch => "second-match",
            Stage::Rendering => "rendering",
            Stage::Done => "done",
            Stage::Error => "error",
        }
    }
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct PatternOutput {
    pub raster: OutputRaster,
    /// Colors that survived reduction, in original palette order.
    pub palette: Palette,
    /// Reduced-palette index per cell, row-major.
    pub indices: PaletteIndexMap,
    /// Cells per reduced-palette entry after the second pass.
    pub counts: ColorCounts,
    /// PNG encoding of `raster`, ready for export.
    pub png: Vec<u8>,
}

/// Turn `image` into an annotated pattern using `palette`.
pub fn generate(
    image: &RgbaImage,
    palette: &Palette,
    config: &PatternConfig,
) -> Result<PatternOutput, PatternError> {
    generate_with(image, palette, config, |_| {})
}

fn generate_with(
    image: &RgbaImage,
    palette: &Palette,
    config: &PatternConfig,
    mut enter: impl FnMut(Stage),
) -> Result<PatternOutput, PatternError> {
    config.validate()?;
    let n = config.grid_size;

    enter(Stage::Sampling);
    let grid = sampler::sample(image, n)?;

    enter(Stage::FirstMatch);
    let full_colors = palette.colors();
    let first = match_all(&grid, &LinearMatcher::new(&full_colors));

    enter(Stage::Reducing);
    let first_counts = count_occurrences(&first, palette.len());
    let keep = select_top_k(&first_counts, config.max_colors);
    let reduced = palette.subset(&keep)?;
    tracing::debug!(
        palette = palette.len(),
        used = first_counts.iter().filter(|&&c| c > 0).count(),
        kept = reduced.len(),
        "reduced palette"
    );

    enter(Stage::SecondMatch);
    let reduced_colors = reduced.colors();
    let indices = match_all(&grid, &LinearMatcher::new(&reduced_colors));
    let counts = count_occurrences(&indices, reduced.len());

    enter(Stage::Rendering);
    let raster = render::render(&RenderInput {
        grid_size: n,
        indices: &indices,
        palette: &reduced,
        counts: &counts,
        config,
    })?;
    let png = raster.encode_png()?;

    Ok(PatternOutput {
        raster,
        palette: reduced,
        indices,
        counts,
        png,
    })
}

/// Proof that [`Session::start`] accepted a run; consumed by
/// [`Session::finish`] or [`Session::abort`]. The session stays busy until one
/// of them is called.
#[derive(Debug)]
#[must_use = "pass the ticket to `Session::finish` or `Session::abort`"]
pub struct RunTicket(());

/// Front-end state for repeated runs, at most one in flight.
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    image: Option<RgbaImage>,
    last_output: Option<PatternOutput>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            image: None,
            last_output: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_busy(&self) -> bool {
        self.stage.is_busy()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Replace the input image used by later runs.
    pub fn set_image(&mut self, image: RgbaImage) -> Result<(), PatternError> {
        if self.is_busy() {
            return Err(PatternError::Busy);
        }
        tracing::debug!(width = image.width(), height = image.height(), "input image set");
        self.image = Some(image);
        Ok(())
    }

    /// Decode `bytes` (any format the `image` crate reads) and use it as input.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), PatternError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        self.set_image(image)
    }

    /// Output of the most recent successful run, kept across later failures.
    pub fn last_output(&self) -> Option<&PatternOutput> {
        self.last_output.as_ref()
    }

    /// PNG bytes of the last good raster, if any.
    pub fn export_png(&self) -> Option<&[u8]> {
        self.last_output.as_ref().map(|o| o.png.as_slice())
    }

    /// Claim the session for a new run. A run already in flight is not queued;
    /// the trigger is refused with [`PatternError::Busy`].
    pub fn start(&mut self) -> Result<RunTicket, PatternError> {
        if self.is_busy() {
            tracing::warn!(stage = self.stage.as_str(), "run rejected, session busy");
            return Err(PatternError::Busy);
        }
        self.stage = Stage::Idle;
        self.enter(Stage::Loading);
        Ok(RunTicket(()))
    }

    /// Load the palette from `source` and run every stage.
    ///
    /// On failure the session moves to [`Stage::Error`] and the previous output
    /// stays available.
    pub fn finish(
        &mut self,
        ticket: RunTicket,
        source: &dyn PaletteSource,
        config: &PatternConfig,
    ) -> Result<&PatternOutput, PatternError> {
        let RunTicket(()) = ticket;
        match self.execute(source, config) {
            Ok(output) => {
                self.enter(Stage::Done);
                tracing::info!(
                    width = output.raster.width(),
                    height = output.raster.height(),
                    colors = output.palette.len(),
                    "pattern ready"
                );
                Ok(&*self.last_output.insert(output))
            }
            Err(e) => {
                self.enter(Stage::Error);
                tracing::warn!(error = %e, "pattern run failed");
                Err(e)
            }
        }
    }

    /// Give up on a started run, e.g. when fetching its palette failed.
    ///
    /// The session moves to [`Stage::Error`] and `err` is handed back.
    pub fn abort(&mut self, ticket: RunTicket, err: PatternError) -> PatternError {
        let RunTicket(()) = ticket;
        self.enter(Stage::Error);
        tracing::warn!(error = %err, "pattern run aborted");
        err
    }

    /// [`start`](Self::start) then [`finish`](Self::finish).
    pub fn run(
        &mut self,
        source: &dyn PaletteSource,
        config: &PatternConfig,
    ) -> Result<&PatternOutput, PatternError> {
        let ticket = self.start()?;
        self.finish(ticket, source, config)
    }

    fn execute(
        &mut self,
        source: &dyn PaletteSource,
        config: &PatternConfig,
    ) -> Result<PatternOutput, PatternError> {
        let image = self.image.as_ref().ok_or(PatternError::InputMissing)?;
        let palette = source.load_palette()?;
        tracing::debug!(entries = palette.len(), "palette loaded");

        let stage = &mut self.stage;
        generate_with(image, &palette, config, |next| {
            tracing::debug!(from = stage.as_str(), to = next.as_str(), "stage");
            *stage = next;
        })
    }

    fn enter(&mut self, next: Stage) {
        tracing::debug!(from = self.stage.as_str(), to = next.as_str(), "stage");
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PaletteJson;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    const RGB: &[u8] = br#"{"rgb": [[1,0,0],[0,1,0],[0,0,1]], "name": ["R","G","B"]}"#;

    fn config(n: u32, k: usize) -> PatternConfig {
        PatternConfig {
            grid_size: n,
            max_colors: k,
            cell_size: 8,
            ..Default::default()
        }
    }

    #[test]
    fn uniform_red_reduces_to_a_single_color() {
        let image = RgbaImage::from_pixel(100, 60, Rgba([255, 0, 0, 255]));
        let palette = Palette::from_json(RGB).unwrap();
        let out = generate(&image, &palette, &config(4, 2)).unwrap();

        assert_eq!(out.indices, vec![0; 16]);
        assert_eq!(out.counts, vec![16]);
        assert_eq!(out.palette.len(), 1);
        assert_eq!(out.palette.get(0).unwrap().name, "R");
    }

    #[test]
    fn dropped_colors_are_remapped_not_discarded() {
        // Left half red, right half slightly-blue-tinted green; K=1 keeps only one.
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        for y in 0..8 {
            for x in 6..8 {
                image.put_pixel(x, y, Rgba([0, 255, 40, 255]));
            }
        }
        let palette = Palette::from_json(RGB).unwrap();
        let out = generate(&image, &palette, &config(4, 1)).unwrap();
        assert_eq!(out.palette.len(), 1);
        assert_eq!(out.palette.get(0).unwrap().name, "R");
        assert_eq!(out.indices.len(), 16);
        assert!(out.indices.iter().all(|&i| i == 0));
        assert_eq!(out.counts, vec![16]);
    }

    #[test]
    fn second_pass_indices_stay_in_reduced_range() {
        let mut image = RgbaImage::new(30, 30);
        for (x, y, px) in image.enumerate_pixels_mut() {
            *px = Rgba([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8, 255]);
        }
        let palette = Palette::from_json(
            br#"{"rgb": [[0,0,0],[1,1,1],[1,0,0],[0,1,0],[0,0,1],[1,1,0],[0.5,0.5,0.5]],
                 "name": ["K","W","R","G","B","Y","M"]}"#,
        )
        .unwrap();
        let out = generate(&image, &palette, &config(6, 3)).unwrap();
        assert!(out.palette.len() <= 3);
        assert!(out.indices.iter().all(|&i| i < out.palette.len()));
        assert_eq!(out.counts.iter().sum::<u32>(), 36);
    }

    #[test]
    fn identical_inputs_give_identical_rasters() {
        let image = RgbaImage::from_fn(40, 25, |x, y| Rgba([(x * 6) as u8, (y * 9) as u8, 90, 255]));
        let palette = Palette::from_json(RGB).unwrap();
        let a = generate(&image, &palette, &config(5, 2)).unwrap();
        let b = generate(&image, &palette, &config(5, 2)).unwrap();
        assert_eq!(a.raster, b.raster);
    }

    #[test]
    fn session_without_image_reports_missing_input() {
        let mut session = Session::new();
        let err = session.run(&PaletteJson(RGB), &config(4, 2)).unwrap_err();
        assert!(matches!(err, PatternError::InputMissing));
        assert_eq!(session.stage(), Stage::Error);
        assert!(!session.is_busy());
    }

    #[test]
    fn session_rejects_trigger_while_busy() {
        let mut session = Session::new();
        session
            .set_image(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255])))
            .unwrap();

        let ticket = session.start().unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.run(&PaletteJson(RGB), &config(4, 2)), Err(PatternError::Busy)));
        assert!(matches!(
            session.set_image(RgbaImage::new(4, 4)),
            Err(PatternError::Busy)
        ));

        let out = session.finish(ticket, &PaletteJson(RGB), &config(4, 2)).unwrap();
        assert_eq!(out.palette.get(0).unwrap().name, "B");
        assert_eq!(session.stage(), Stage::Done);
    }

    #[test]
    fn failed_run_keeps_previous_output() {
        let mut session = Session::new();
        session
            .set_image(RgbaImage::from_pixel(16, 16, Rgba([0, 255, 0, 255])))
            .unwrap();
        session.run(&PaletteJson(RGB), &config(4, 2)).unwrap();

        let err = session
            .run(&PaletteJson(br#"{"rgb": [[1,1,1]], "name": []}"#), &config(4, 2))
            .unwrap_err();
        assert!(matches!(err, PatternError::ResourceLoad(_)));
        assert_eq!(session.stage(), Stage::Error);

        let kept = session.last_output().unwrap();
        assert_eq!(kept.palette.get(0).unwrap().name, "G");
        assert!(session.export_png().unwrap().starts_with(b"\x89PNG"));

        // A fresh trigger after an error runs again from the start.
        session.run(&PaletteJson(RGB), &config(2, 1)).unwrap();
        assert_eq!(session.stage(), Stage::Done);
        assert_eq!(session.last_output().unwrap().indices.len(), 4);
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let mut session = Session::new();
        assert!(matches!(
            session.load_image_bytes(b"not an image"),
            Err(PatternError::Decode(_))
        ));
    }

    #[test]
    fn aborted_run_frees_the_session() {
        let mut session = Session::new();
        session
            .set_image(RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255])))
            .unwrap();

        let ticket = session.start().unwrap();
        let err = session.abort(ticket, PatternError::ResourceLoad(crate::error::PaletteError::Empty));
        assert!(matches!(err, PatternError::ResourceLoad(_)));
        assert_eq!(session.stage(), Stage::Error);
        assert!(!session.is_busy());

        session.run(&PaletteJson(RGB), &config(4, 2)).unwrap();
        assert_eq!(session.stage(), Stage::Done);
    }

    #[test]
    fn output_carries_its_png_encoding() {
        let image = RgbaImage::from_pixel(12, 12, Rgba([0, 0, 255, 255]));
        let palette = Palette::from_json(RGB).unwrap();
        let out = generate(&image, &palette, &config(3, 2)).unwrap();
        let decoded = image::load_from_memory(&out.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (out.raster.width(), out.raster.height()));
    }

    #[test]
    fn extreme_sizes_are_config_errors() {
        let image = RgbaImage::from_pixel(64, 64, Rgba([0, 255, 0, 255]));
        let palette = Palette::from_json(RGB).unwrap();
        for cfg in [
            PatternConfig { grid_size: 64, cell_size: 70_000_000, ..Default::default() },
            PatternConfig { font_size: u32::MAX, ..Default::default() },
        ] {
            let err = generate(&image, &palette, &cfg).unwrap_err();
            assert!(matches!(err, PatternError::InvalidConfig(_)));
        }
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use image_to_bead_pattern_wasm::{
    EXPORT_FILE_NAME, LegendPosition, PaletteFile, PatternConfig, Session, demo,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn images into bead / cross-stitch patterns with a numbered grid and color legend.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input image paths
    inputs: Vec<PathBuf>,

    /// Use the built-in gradient demo as input instead of files
    #[arg(long)]
    demo: bool,

    /// Palette JSON with parallel `rgb` and `name` lists
    #[arg(short, long)]
    palette: PathBuf,

    /// JSON config file (camelCase keys); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid resolution N (N × N cells)
    #[arg(short = 'n', long)]
    grid_size: Option<u32>,

    /// Maximum number of palette colors kept
    #[arg(short = 'k', long)]
    max_colors: Option<usize>,

    /// Do not draw names in cells and legend
    #[arg(long)]
    no_names: bool,

    /// Base label font size (px)
    #[arg(long)]
    font_size: Option<u32>,

    /// Grid cell edge (px)
    #[arg(long)]
    cell_size: Option<u32>,

    /// Legend placement: right or bottom
    #[arg(long)]
    legend: Option<LegendPosition>,

    /// Legend swatch width, in cells
    #[arg(long)]
    swatch_width: Option<f32>,

    /// Legend swatch height, in cells
    #[arg(long)]
    swatch_height: Option<f32>,

    /// Horizontal gap between legend columns, in cells
    #[arg(long)]
    gap_x: Option<f32>,

    /// Vertical gap between legend rows, in cells
    #[arg(long)]
    gap_y: Option<f32>,

    /// Output directory (default: current directory)
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,
}

impl Args {
    fn pattern_config(&self) -> Result<PatternConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                PatternConfig::from_json(&json)?
            }
            None => PatternConfig::default(),
        };
        if let Some(v) = self.grid_size {
            cfg.grid_size = v;
        }
        if let Some(v) = self.max_colors {
            cfg.max_colors = v;
        }
        if self.no_names {
            cfg.show_names = false;
        }
        if let Some(v) = self.font_size {
            cfg.font_size = v;
        }
        if let Some(v) = self.cell_size {
            cfg.cell_size = v;
        }
        if let Some(v) = self.legend {
            cfg.legend_position = v;
        }
        if let Some(v) = self.swatch_width {
            cfg.swatch_width_ratio = v;
        }
        if let Some(v) = self.swatch_height {
            cfg.swatch_height_ratio = v;
        }
        if let Some(v) = self.gap_x {
            cfg.gap_x_ratio = v;
        }
        if let Some(v) = self.gap_y {
            cfg.gap_y_ratio = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn run_one(
    session: &mut Session,
    palette: &PaletteFile,
    config: &PatternConfig,
    out_path: &Path,
) -> Result<()> {
    let output = session.run(palette, config).context("pattern generation failed")?;
    for (entry, count) in output.palette.entries().iter().zip(&output.counts) {
        tracing::info!(name = %entry.name, count, "color");
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(out_path, &output.png).with_context(|| format!("writing {}", out_path.display()))?;
    println!("Saved → {}", out_path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_to_bead_pattern_wasm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let args = Args::parse();
    if args.inputs.is_empty() && !args.demo {
        bail!("no input images given (pass file paths or --demo)");
    }

    let config = args.pattern_config()?;
    let palette = PaletteFile(args.palette.clone());
    let out_dir = args.out_dir.clone().unwrap_or_default();
    let mut session = Session::new();

    if args.demo {
        session.set_image(demo::gradient_demo())?;
        run_one(&mut session, &palette, &config, &out_dir.join(EXPORT_FILE_NAME))?;
    }

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        session
            .load_image_bytes(&bytes)
            .with_context(|| format!("decoding {}", input.display()))?;

        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        run_one(&mut session, &palette, &config, &out_dir.join(format!("{stem}.png")))?;
    }

    Ok(())
}

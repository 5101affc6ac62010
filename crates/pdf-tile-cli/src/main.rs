use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::Level;
use pdf_tile::{
    CancelToken, ExportOptions, FailurePolicy, MaskModel, SourceDocument, TilingConfig,
    detect_format, export_tiles_with, generate_masks, grid_dimensions, load_pdf, tile_file_name,
};
use std::path::{Path, PathBuf};

mod logger;

use logger::CliLogger;

#[derive(Parser)]
#[command(name = "pdftile", about = "Split large-format drawings into printable tiles", version)]
struct Cli {
    /// More log output (repeat for debug and trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page size and detected sheet format
    Detect {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Show the tile grid for a page without writing anything
    Grid {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        #[command(flatten)]
        tiling: TilingArgs,

        /// Print the masks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write one PDF per tile
    Split {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        #[command(flatten)]
        tiling: TilingArgs,

        /// Output file base name (defaults to the input file name)
        #[arg(long)]
        base_name: Option<String>,

        /// Tiles written at the same time
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Stop starting new tiles after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// List the files that would be written
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a tiling config file
    Config {
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        tiling: TilingArgs,
    },
}

/// Tiling settings. Flags override values from `--config`.
#[derive(Args)]
struct TilingArgs {
    /// Tiling config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overlap between neighbouring tiles, in percent
    #[arg(long)]
    overlap: Option<f64>,

    /// Tile sheet format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Tile orientation
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Shorthand for `--orientation landscape`
    #[arg(long, conflicts_with = "orientation")]
    landscape: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    A0,
    #[value(name = "a0x2")]
    A0x2,
    #[value(name = "a0x3")]
    A0x3,
    A1,
    A2,
    A3,
    A4,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<FormatArg> for &'static str {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::A0 => "A0",
            FormatArg::A0x2 => "A0x2",
            FormatArg::A0x3 => "A0x3",
            FormatArg::A1 => "A1",
            FormatArg::A2 => "A2",
            FormatArg::A3 => "A3",
            FormatArg::A4 => "A4",
        }
    }
}

impl From<OrientationArg> for pdf_tile::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl TilingArgs {
    /// Config file (or defaults) with command-line flags applied on top
    async fn resolve(&self) -> Result<TilingConfig> {
        let mut config = match &self.config {
            Some(path) => TilingConfig::load(path)
                .await
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => TilingConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut TilingConfig) {
        if let Some(overlap) = self.overlap {
            config.overlap_percent = overlap;
        }
        if let Some(format) = self.format {
            let name: &'static str = format.into();
            config.mask_format = name.to_string();
        }
        if self.landscape {
            config.landscape = true;
        } else if let Some(orientation) = self.orientation {
            config.landscape = pdf_tile::Orientation::from(orientation).is_landscape();
        }
    }
}

/// Convert a 1-based page number to an index, checking the page exists
fn page_index(source: &SourceDocument, page: usize) -> Result<usize> {
    if page == 0 || page > source.page_count() {
        bail!(
            "Page {} does not exist ({} has {} pages)",
            page,
            source.path().display(),
            source.page_count()
        );
    }
    Ok(page - 1)
}

async fn load_page(input: &Path, page: usize) -> Result<(SourceDocument, usize)> {
    let source = load_pdf(input).await?;
    let index = page_index(&source, page)?;
    Ok((source, index))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logger = CliLogger::new(500, CliLogger::level_from_flags(cli.verbose, cli.quiet));
    logger.clone().init()?;

    match cli.command {
        Commands::Detect { input, page } => {
            let (source, index) = load_page(&input, page).await?;
            let geometry = source
                .page_size_pt(index)
                .context("Page has no usable size")?;
            let (width_mm, height_mm) = geometry.size_mm();

            println!("{}", input.display());
            println!("  Pages: {}", source.page_count());
            println!(
                "  Page {}: {:.1} x {:.1} mm ({:.1} x {:.1} pt)",
                page, width_mm, height_mm, geometry.width_pt, geometry.height_pt
            );
            match detect_format(geometry) {
                Some(format) => println!("  Format: {}", format.name),
                None => println!("  Format: not a standard sheet"),
            }
        }

        Commands::Grid {
            input,
            page,
            tiling,
            json,
        } => {
            let config = tiling.resolve().await?;
            let (source, index) = load_page(&input, page).await?;
            let geometry = source
                .page_size_pt(index)
                .context("Page has no usable size")?;

            let mut model = MaskModel::new();
            model.set_all(generate_masks(geometry, &config)?);

            if json {
                println!("{}", serde_json::to_string_pretty(model.masks())?);
                return Ok(());
            }

            let (cols, rows) = grid_dimensions(geometry, &config)?;
            println!(
                "Grid: {} columns x {} rows, {} tiles ({} {}, {}% overlap)",
                cols,
                rows,
                model.len(),
                config.mask_format,
                if config.landscape { "landscape" } else { "portrait" },
                config.overlap_percent
            );
            for mask in model.masks() {
                println!("  {}", mask);
            }
        }

        Commands::Split {
            input,
            output,
            page,
            tiling,
            base_name,
            jobs,
            fail_fast,
            dry_run,
        } => {
            let config = tiling.resolve().await?;
            let options = ExportOptions {
                max_concurrency: jobs,
                failure_policy: if fail_fast {
                    FailurePolicy::StopOnFirstError
                } else {
                    FailurePolicy::Continue
                },
                base_name,
            };
            options.validate()?;

            let (source, index) = load_page(&input, page).await?;
            let geometry = source
                .page_size_pt(index)
                .context("Page has no usable size")?;

            let mut model = MaskModel::new();
            model.set_all(generate_masks(geometry, &config)?);
            let masks = model.snapshot();

            if dry_run {
                let base = options.base_name.clone().unwrap_or_else(|| source.base_name());
                for (i, mask) in masks.iter().enumerate() {
                    let path = output.join(tile_file_name(&base, i + 1));
                    println!("{}  {}", path.display(), mask);
                }
                return Ok(());
            }

            let report = export_tiles_with(
                &source,
                index,
                &masks,
                &output,
                &options,
                &CancelToken::new(),
                |done, total| log::info!("Tile {}/{} done", done, total),
            )
            .await?;

            println!(
                "Wrote {} of {} tiles → {}",
                report.written.len(),
                masks.len(),
                output.display()
            );
            for failed in &report.failed {
                println!("  Failed {}: {}", failed.path.display(), failed.error);
            }
            if report.skipped > 0 {
                println!("  Skipped {} tiles", report.skipped);
            }

            let warnings = logger.count_at_least(Level::Warn);
            if warnings > 0 {
                println!("{} warnings logged", warnings);
            }

            if !report.is_complete() {
                if let Some(last) = logger
                    .entries()
                    .into_iter()
                    .rev()
                    .find(|e| e.level == Level::Error)
                {
                    eprintln!(
                        "Last error at {}: {}",
                        last.timestamp.format("%H:%M:%S"),
                        last.message
                    );
                }
                bail!(
                    "{} tiles failed, {} skipped",
                    report.failed.len(),
                    report.skipped
                );
            }
        }

        Commands::Config { output, tiling } => {
            let config = tiling.resolve().await?;
            config.save(&output).await?;
            println!("Saved config → {}", output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiling_args(args: &[&str]) -> TilingArgs {
        let mut argv = vec!["pdftile", "config", "-o", "out.json"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Config { tiling, .. } => tiling,
            _ => panic!("Expected config command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = TilingConfig::new(20.0, "A3", true);
        tiling_args(&["--overlap", "5", "--format", "a0x2", "--orientation", "portrait"])
            .apply(&mut config);

        assert_eq!(config.overlap_percent, 5.0);
        assert_eq!(config.mask_format, "A0x2");
        assert!(!config.landscape);
    }

    #[test]
    fn test_missing_flags_keep_config() {
        let mut config = TilingConfig::new(20.0, "A3", true);
        tiling_args(&[]).apply(&mut config);
        assert_eq!(config, TilingConfig::new(20.0, "A3", true));
    }

    #[test]
    fn test_landscape_shorthand() {
        let mut config = TilingConfig::default();
        tiling_args(&["--landscape"]).apply(&mut config);
        assert!(config.landscape);

        let conflict = Cli::try_parse_from([
            "pdftile",
            "config",
            "-o",
            "out.json",
            "--landscape",
            "--orientation",
            "portrait",
        ]);
        assert!(conflict.is_err());
    }
}

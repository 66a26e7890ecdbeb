//! # Image Reducer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Composizione della configurazione (file JSON, preset, flag CLI)
//! - Avvio della scansione e stampa del report finale
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` vince)
//! 3. Carica l'eventuale file `--config` e vi applica sopra preset e flag
//! 4. Rileva ImageMagick / GraphicsMagick e avvia la scansione
//! 5. Stampa il report testuale oppure un oggetto JSON con `--json`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! reduce-image --source-path ./site/img --dest-path ./dist/img --full-optimization
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use image_reducer::json_output::JsonMessage;
use image_reducer::progress::ScanProgress;
use image_reducer::{Config, ImageMagickEngine, ImageReducer, OutputFormat};

#[derive(Parser)]
#[command(name = "reduce-image", version)]
#[command(about = "Mirror a directory tree of images into a smaller copy")]
struct Args {
    /// Directory to scan for images
    #[arg(long)]
    source_path: Option<PathBuf>,

    /// Directory receiving the reduced tree
    #[arg(long)]
    dest_path: Option<PathBuf>,

    /// Load options from a JSON file (command line flags take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum output width in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Shrink both sides by at least this percentage (0-100)
    #[arg(long)]
    min_size_reduction: Option<u8>,

    /// Encoder quality (0-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Blur radius applied before JPEG encoding
    #[arg(long)]
    jpeg_blur: Option<f64>,

    /// Output format for direct-color images
    #[arg(long, value_enum)]
    force_direct_color_output_format: Option<OutputFormat>,

    /// Output format for indexed-color images
    #[arg(long, value_enum)]
    force_indexed_color_output_format: Option<OutputFormat>,

    /// Bits per channel for direct-color output (1, 4, 8, 15, 16, 18, 24, 32)
    #[arg(long)]
    direct_color_bit_depth: Option<u8>,

    /// Palette bits for indexed-color output (1-8)
    #[arg(long)]
    indexed_color_bit_depth: Option<u8>,

    /// Re-encode every PNG with an indexed palette
    #[arg(long)]
    force_png_to_indexed: bool,

    /// Convert direct-color PNGs to JPEG
    #[arg(long)]
    force_png_to_jpg: bool,

    /// Preset: 420x600, 30% reduction, quality 20, depths 8/5, indexed PNGs, blur 2, recursive
    #[arg(long)]
    full_optimization: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Print a single JSON object instead of the text report
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Layer the command line over `base`
    fn apply_to(self, base: Config) -> Config {
        let mut config = if self.full_optimization {
            base.full_optimization()
        } else {
            base
        };

        if let Some(path) = self.source_path {
            config.source_path = path;
        }
        if let Some(path) = self.dest_path {
            config.dest_path = path;
        }

        config.max_width = self.max_width.or(config.max_width);
        config.max_height = self.max_height.or(config.max_height);
        config.min_size_reduction = self.min_size_reduction.or(config.min_size_reduction);
        config.quality = self.quality.or(config.quality);
        config.jpeg_blur = self.jpeg_blur.or(config.jpeg_blur);
        config.force_direct_color_output_format = self
            .force_direct_color_output_format
            .or(config.force_direct_color_output_format);
        config.force_indexed_color_output_format = self
            .force_indexed_color_output_format
            .or(config.force_indexed_color_output_format);
        config.direct_color_bit_depth = self.direct_color_bit_depth.or(config.direct_color_bit_depth);
        config.indexed_color_bit_depth = self.indexed_color_bit_depth.or(config.indexed_color_bit_depth);

        config.force_png_to_indexed |= self.force_png_to_indexed;
        config.force_png_to_jpg |= self.force_png_to_jpg;
        config.recursive |= self.recursive;
        config.verbose |= self.verbose;
        config.json_output |= self.json;

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let json = args.json;

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let start_time = Instant::now();
    match reduce(args).await {
        Ok(stats) => {
            let elapsed = start_time.elapsed();
            if json {
                JsonMessage::complete(stats, elapsed).emit();
            } else {
                println!("{}", stats.format_report(elapsed));
            }
            Ok(())
        }
        Err(err) => {
            if json {
                JsonMessage::error(err.to_string()).emit();
            } else {
                eprintln!("Oh no! {}", err);
            }
            std::process::exit(1);
        }
    }
}

async fn reduce(args: Args) -> Result<image_reducer::RunStats> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path).await?
        }
        None => Config::default(),
    };

    let config = args.apply_to(base);
    config.validate()?;

    let engine = ImageMagickEngine::detect().await?;
    let progress = if config.verbose || config.json_output {
        ScanProgress::hidden()
    } else {
        ScanProgress::spinner()
    };

    let stats = ImageReducer::new(config, engine)
        .with_progress(progress)
        .run()
        .await?;
    Ok(stats)
}

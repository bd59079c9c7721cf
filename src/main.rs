use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use framefx::{
    config::Config,
    effects::{EffectSpec, RgbColor},
    pipeline::{Pipeline, RunRequest, WorkingContext},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Operation {
    /// Inverted colors with brightness kept as alpha
    Negative,
    /// Colored light projected through the negative
    NegativeReimage,
    /// Replace the key color with a background
    Chromakey,
}

#[derive(Parser)]
#[command(
    name = "framefx",
    version,
    about = "Apply chroma-key and negative effects to images and videos",
    long_about = "framefx splits a video into frames, applies a per-pixel effect to every frame, and reassembles the frames into a video. Single images are processed directly."
)]
struct Cli {
    /// Input image, video, or frame directory
    #[arg(short, long)]
    input: PathBuf,

    /// Output image or video
    #[arg(short, long)]
    output: PathBuf,

    /// Effect to apply
    #[arg(long, value_enum)]
    operation: Operation,

    /// Hex color (RRGGBB or #RRGGBB): key color for chromakey, light color for negative-reimage
    #[arg(short, long)]
    color: Option<String>,

    /// Chroma key color distance tolerance
    #[arg(long)]
    tolerance: Option<f32>,

    /// Luma above which pixels are never keyed out (0-255)
    #[arg(long)]
    white_protect: Option<f32>,

    /// Background image, video, or frame directory
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Directory for intermediate frame sequences
    #[arg(short = 'w', long)]
    working_directory: PathBuf,

    /// Label appended to the timestamped sequence prefix
    #[arg(long)]
    sequence_name: Option<String>,

    /// Use this exact sequence prefix instead of a timestamp
    #[arg(long, conflicts_with = "sequence_name")]
    sequence_prefix: Option<String>,

    /// Delete intermediate frames after processing
    #[arg(long)]
    cleanup: bool,

    /// Configuration file (optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Validate the color arguments and build the effect before any work starts
    fn effect(&self, config: &Config) -> framefx::Result<EffectSpec> {
        let color = || -> framefx::Result<RgbColor> {
            let value = self.color.as_deref().ok_or_else(|| framefx::error::ConfigError::InvalidValue {
                key: "color".to_string(),
                value: format!("missing (required by {:?})", self.operation),
            })?;
            value.parse()
        };

        Ok(match self.operation {
            Operation::Negative => EffectSpec::Negative,
            Operation::NegativeReimage => EffectSpec::NegativeReimage { light_color: color()? },
            Operation::Chromakey => EffectSpec::ChromaKey {
                key_color: color()?,
                tolerance: config.effects.tolerance,
                white_protect: config.effects.white_protect,
            },
        })
    }
}

fn init_logging(verbose: bool, level: &str) {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };
    if let Some(tolerance) = cli.tolerance {
        config.effects.tolerance = tolerance;
    }
    if let Some(white_protect) = cli.white_protect {
        config.effects.white_protect = white_protect;
    }

    init_logging(cli.verbose, &config.logging.level);
    info!("Starting framefx v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    let effect = match cli.effect(&config) {
        Ok(effect) => effect,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    let ctx = match &cli.sequence_prefix {
        Some(prefix) => WorkingContext::with_prefix(&cli.working_directory, prefix.as_str(), cli.cleanup),
        None => WorkingContext::new(&cli.working_directory, cli.sequence_name.as_deref(), cli.cleanup),
    };

    let request = RunRequest {
        input: cli.input.clone(),
        background: cli.background.clone(),
        output: cli.output.clone(),
    };

    let pipeline = Pipeline::with_ffmpeg(config, effect);
    let report = match pipeline.run(ctx, request).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    for failure in &report.failed {
        warn!("Skipped {}", failure);
    }
    if let Some(cleanup) = &report.cleanup {
        if !cleanup.is_clean() {
            warn!("Cleanup left {} items behind", cleanup.failures.len());
        }
    }

    match &report.output {
        Some(output) => info!("Done: {}/{} frames, output saved to {:?}",
                              report.succeeded.len(), report.frame_count, output),
        None => info!("Done: {}/{} frames written", report.succeeded.len(), report.frame_count),
    }

    if report.succeeded.is_empty() {
        bail!("no frames were processed successfully");
    }
    Ok(())
}

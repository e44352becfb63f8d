use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use carbonfmt::input::{parse_json_series, parse_protobuf_series};
use carbonfmt::{render, Format, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Protobuf,
}

#[derive(Parser, Debug)]
#[command(name = "carbonfmt")]
#[command(about = "Render fetched metric series as csv, json, pickle, protobuf or raw")]
struct Args {
    /// File holding the fetched series
    input: PathBuf,

    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How the input file is encoded
    #[arg(long, value_enum, default_value = "json")]
    input_format: InputFormat,

    /// Output format (csv, json, pickle, protobuf, raw)
    #[arg(short, long)]
    format: Option<Format>,

    /// Maximum points per series; 0 disables downsampling
    #[arg(short = 'n', long)]
    max_points: Option<usize>,

    /// Offset from UTC in seconds for csv timestamps (default: local time)
    #[arg(long, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    if let Some(format) = args.format {
        settings.format = format;
    }
    if let Some(max_points) = args.max_points {
        settings.max_points = max_points;
    }
    if let Some(offset) = args.utc_offset {
        settings.utc_offset_secs = Some(offset);
    }

    init_logging(&settings.log_level);

    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let mut series = match args.input_format {
        InputFormat::Json => parse_json_series(&bytes),
        InputFormat::Protobuf => parse_protobuf_series(&bytes),
    }
    .with_context(|| format!("failed to parse {}", args.input.display()))?;
    info!(series = series.len(), "loaded input");

    let options = settings.render_options()?;
    let rendered = render(settings.format, &mut series, &options)
        .with_context(|| format!("failed to encode as {}", settings.format))?;

    for error in &rendered.errors {
        warn!(series = error.series(), "{error}");
    }

    match args.output {
        Some(path) => fs::write(&path, &rendered.body)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&rendered.body)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout carries only the rendered payload.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

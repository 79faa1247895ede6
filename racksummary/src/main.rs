use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use racksummary_core::config::{ConfigFile, OutputDestination};
use racksummary_core::{RackError, RackLayoutEngine, export, fonts, source};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

/// Render the front and back of a rack with its units onto one page.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Opts {
    /// Diagram configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Unit records (JSON array)
    #[arg(short, long, value_name = "FILE")]
    units: PathBuf,

    /// Only place the units of this rack
    #[arg(short, long)]
    rack: Option<String>,

    /// Output file, overrides the configuration
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// pdf, svg or png; taken from the output file extension when omitted
    #[arg(short, long)]
    encoding: Option<String>,

    /// file, download or inline
    #[arg(short, long)]
    destination: Option<String>,

    /// Font file used for measuring and as the sans-serif face
    #[arg(long, value_name = "FILE", env = "RACKSUMMARY_FONT")]
    font: Option<PathBuf>,

    /// Raster resolution for png output
    #[arg(long, value_name = "PX")]
    px_per_mm: Option<f64>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    configure_tracing(opts.verbose);

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.chain().find_map(|e| e.downcast_ref::<RackError>()) {
                Some(rack_err) => eprintln!("error[{}]: {err:#}", rack_err.code()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn configure_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(opts: &Opts) -> Result<()> {
    let file = ConfigFile::load(&opts.config)
        .with_context(|| format!("reading configuration {}", opts.config.display()))?;
    let base_dir = opts
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut builder = file.to_builder(base_dir)?;

    if let Some(output) = &opts.output {
        builder.output_path(output);
    }
    let encoding = opts.encoding.clone().or_else(|| {
        opts.output
            .as_deref()
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .filter(|ext| matches!(*ext, "pdf" | "svg" | "png"))
            .map(str::to_string)
    });
    if let Some(encoding) = &encoding {
        builder.output_encoding(encoding)?;
    }
    if let Some(destination) = &opts.destination {
        builder.output_destination(destination)?;
    }
    if let Some(px) = opts.px_per_mm {
        builder.px_per_mm(px)?;
    }
    let config = builder.build()?;

    let records = source::load_units(&opts.units)
        .with_context(|| format!("reading units {}", opts.units.display()))?;
    let units = source::select_units(records, opts.rack.as_deref())?;
    info!(rack = %config.rack().name, units = units.len(), "units loaded");

    let db = fonts::load_database(opts.font.as_deref())?;
    debug!(faces = db.len(), "font database ready");
    let measure = fonts::metrics_for(&db, &config.page().font_family);

    let generated_at = Utc::now();
    let rendered = RackLayoutEngine::new(&config).render(&units, measure, generated_at)?;
    let bytes = export::encode(&rendered.page, &config, Arc::new(db), generated_at)?;

    let output = config.output();
    if output.destination != OutputDestination::File {
        let disposition = match output.destination {
            OutputDestination::Download => "attachment",
            _ => "inline",
        };
        let filename = output
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("rack.{}", output.encoding.extension()));
        info!(
            content_type = output.encoding.mime_type(),
            disposition = %format!("{disposition}; filename=\"{filename}\""),
            "streaming to stdout"
        );
    }
    export::deliver(&bytes, output, &mut std::io::stdout().lock())?;
    Ok(())
}

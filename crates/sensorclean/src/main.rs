use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sensorclean::batch::{self, clean_batch, InputFormat, OutputFormat};
use sensorclean::{router, AppState};
use sensorclean_core::CleaningConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Parser, Debug)]
#[command(author, version, about = "Sensor time-series cleaning service and CLI", long_about = None)]
struct Cli {
    /// TOML file overriding the cleaning thresholds (falls back to SENSORCLEAN_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the /clean HTTP endpoint
    Serve(ServeArgs),
    /// Clean a CSV or JSON file of readings
    Clean(CleanArgs),
    /// Print the effective cleaning configuration as TOML
    ShowConfig,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Listen address (falls back to SENSORCLEAN_BIND, then 0.0.0.0:3000)
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Input file; `.csv` or `.json`
    #[arg(long, short)]
    input: PathBuf,
    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Also write every intermediate stage to this parquet file
    #[arg(long)]
    stages_parquet: Option<PathBuf>,
    /// Print an ingestion and cleaning summary to stderr
    #[arg(long)]
    summary: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = batch::load_config(
        cli.config.as_deref(),
        std::env::var(batch::CONFIG_ENV).ok(),
    )?;

    match cli.command {
        Command::Serve(args) => handle_serve(args, config).await,
        Command::Clean(args) => handle_clean(args, &config),
        Command::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn handle_serve(args: ServeArgs, config: CleaningConfig) -> Result<()> {
    let bind = args
        .bind
        .or_else(|| std::env::var("SENSORCLEAN_BIND").ok())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let app = router(Arc::new(AppState::new(config)));
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn handle_clean(args: CleanArgs, config: &CleaningConfig) -> Result<()> {
    let input_format = InputFormat::from_path(&args.input)?;
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let report = clean_batch(
        BufReader::new(file),
        input_format,
        BufWriter::new(sink),
        args.format,
        config,
        args.stages_parquet.as_deref(),
    )?;

    if args.summary {
        eprintln!("{}", batch::summary_table(&report.ingestion, &report.summary));
    }

    info!(
        input = %args.input.display(),
        rows = report.summary.rows,
        dropped = report.ingestion.dropped(),
        "cleaned file"
    );
    Ok(())
}

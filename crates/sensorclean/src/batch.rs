//! File-based cleaning behind the `clean` and `show-config` subcommands.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use comfy_table::Table;
use sensorclean_core::ingestion::{read_csv_records, read_json_records};
use sensorclean_core::outputs::{write_csv, write_json, write_parquet};
use sensorclean_core::{ingest_records, run_stages, CleaningConfig, CleaningSummary, IngestionReport};
use tracing::info;

pub const CONFIG_ENV: &str = "SENSORCLEAN_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Infers the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::Json),
            _ => bail!(
                "cannot infer input format of {}; expected .csv or .json",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchReport {
    pub ingestion: IngestionReport,
    pub summary: CleaningSummary,
}

/// Reads one batch from `reader`, cleans it and writes the result to `writer`.
/// When `stages_parquet` is set, every intermediate stage is written there too.
pub fn clean_batch<R: Read, W: Write>(
    reader: R,
    input: InputFormat,
    writer: W,
    output: OutputFormat,
    config: &CleaningConfig,
    stages_parquet: Option<&Path>,
) -> Result<BatchReport> {
    let records = match input {
        InputFormat::Csv => read_csv_records(reader)?,
        InputFormat::Json => read_json_records(reader)?,
    };

    let batch = ingest_records(&records)?;
    let stages = run_stages(&batch.samples, config);
    let summary = stages.summary();

    if let Some(path) = stages_parquet {
        let df = stages.to_dataframe()?;
        write_parquet(path, &df)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = df.height(), "wrote stage diagnostics");
    }

    let samples = stages.cleaned_samples();
    match output {
        OutputFormat::Csv => write_csv(writer, &samples)?,
        OutputFormat::Json => write_json(writer, &samples)?,
    }

    Ok(BatchReport {
        ingestion: batch.report,
        summary,
    })
}

/// The `--config` flag wins over the environment variable.
pub fn resolve_config_path(flag: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

pub fn load_config(flag: Option<&Path>, env_value: Option<String>) -> Result<CleaningConfig> {
    match resolve_config_path(flag, env_value) {
        Some(path) => {
            let config = CleaningConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            info!(path = %path.display(), "loaded cleaning configuration");
            Ok(config)
        }
        None => Ok(CleaningConfig::default()),
    }
}

pub fn summary_table(report: &IngestionReport, summary: &CleaningSummary) -> Table {
    let window = summary
        .smoothing_window
        .map(|w| w.to_string())
        .unwrap_or_else(|| "skipped".to_string());

    let rows: [(&str, String); 10] = [
        ("rows received", report.received.to_string()),
        ("invalid timestamps", report.invalid_timestamps.to_string()),
        ("invalid values", report.invalid_values.to_string()),
        ("rows cleaned", summary.rows.to_string()),
        ("out of range", summary.out_of_range.to_string()),
        ("spikes corrected", summary.spikes_corrected.to_string()),
        ("gaps filled", summary.gaps_filled.to_string()),
        ("still missing", summary.unresolved_missing.to_string()),
        ("despike applied", summary.despike_applied.to_string()),
        ("smoothing window", window),
    ];

    let mut table = Table::new();
    table.set_header(vec!["metric", "value"]);
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    table
}

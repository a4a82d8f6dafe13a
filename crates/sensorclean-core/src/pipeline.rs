use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CleaningConfig;
use crate::despike::despike;
use crate::error::Result;
use crate::ingestion::{ingest_records, IngestionReport, RawRecord};
use crate::range_filter::apply_range_filter;
use crate::smoother::{effective_window, smooth};
use crate::types::{CleanedSample, Sample};

/// Every intermediate curve of one pipeline run, index-aligned with `timestamps`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutputs {
    pub timestamps: Vec<DateTime<Utc>>,
    pub raw: Vec<Option<f64>>,
    pub in_range: Vec<Option<f64>>,
    pub despiked: Vec<Option<f64>>,
    pub cleaned: Vec<Option<f64>>,
    pub despike_applied: bool,
    pub smoothing_window: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub rows: usize,
    pub out_of_range: usize,
    pub spikes_corrected: usize,
    pub gaps_filled: usize,
    pub unresolved_missing: usize,
    pub despike_applied: bool,
    pub smoothing_window: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub samples: Vec<CleanedSample>,
    pub ingestion: IngestionReport,
    pub summary: CleaningSummary,
}

/// Runs range filter, despiker and smoother in that order over an ordered series.
pub fn run_stages(series: &[Sample], config: &CleaningConfig) -> StageOutputs {
    let timestamps: Vec<DateTime<Utc>> = series.iter().map(|sample| sample.timestamp).collect();
    let raw: Vec<Option<f64>> = series.iter().map(|sample| sample.value).collect();

    let in_range = apply_range_filter(&raw, config.range_low, config.range_high);
    let despiked = despike(&in_range, config.despike_window, config.spike_threshold);
    let cleaned = smooth(&despiked, config.min_smoothing_window, config.poly_order);

    let despike_applied = series.len() >= config.despike_window;
    let smoothing_window = effective_window(series.len(), config.min_smoothing_window);

    debug!(
        rows = series.len(),
        despike_applied,
        smoothing_window = ?smoothing_window,
        "pipeline stages complete"
    );

    StageOutputs {
        timestamps,
        raw,
        in_range,
        despiked,
        cleaned,
        despike_applied,
        smoothing_window,
    }
}

/// Cleans an ordered series into its wire representation.
pub fn clean_series(series: &[Sample], config: &CleaningConfig) -> Vec<CleanedSample> {
    run_stages(series, config).cleaned_samples()
}

/// Boundary entry point: ingests raw rows and cleans the surviving series.
pub fn clean_records(records: &[RawRecord], config: &CleaningConfig) -> Result<CleaningOutcome> {
    let batch = ingest_records(records)?;
    let stages = run_stages(&batch.samples, config);
    let summary = stages.summary();

    info!(
        received = batch.report.received,
        rows = summary.rows,
        out_of_range = summary.out_of_range,
        spikes_corrected = summary.spikes_corrected,
        gaps_filled = summary.gaps_filled,
        unresolved_missing = summary.unresolved_missing,
        smoothing_window = ?summary.smoothing_window,
        "cleaned sensor batch"
    );

    Ok(CleaningOutcome {
        samples: stages.cleaned_samples(),
        ingestion: batch.report,
        summary,
    })
}

impl StageOutputs {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn cleaned_samples(&self) -> Vec<CleanedSample> {
        self.timestamps
            .iter()
            .zip(&self.cleaned)
            .map(|(timestamp, cleaned)| CleanedSample {
                timestamp: *timestamp,
                cleaned: *cleaned,
            })
            .collect()
    }

    pub fn summary(&self) -> CleaningSummary {
        let out_of_range = self
            .raw
            .iter()
            .zip(&self.in_range)
            .filter(|(raw, kept)| raw.is_some() && kept.is_none())
            .count();

        let mut spikes_corrected = 0;
        let mut gaps_filled = 0;
        for (before, after) in self.in_range.iter().zip(&self.despiked) {
            match (before, after) {
                (Some(b), Some(a)) if b != a => spikes_corrected += 1,
                (None, Some(_)) => gaps_filled += 1,
                _ => {}
            }
        }

        CleaningSummary {
            rows: self.len(),
            out_of_range,
            spikes_corrected,
            gaps_filled,
            unresolved_missing: self.cleaned.iter().filter(|value| value.is_none()).count(),
            despike_applied: self.despike_applied,
            smoothing_window: self.smoothing_window,
        }
    }

    /// One row per sample with every stage as a column; missing values are nulls.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let timestamp_series = Series::new(
            "timestamp_utc".into(),
            self.timestamps
                .iter()
                .map(|ts| ts.timestamp_micros())
                .collect::<Vec<_>>(),
        )
        .cast(&DataType::Datetime(
            TimeUnit::Microseconds,
            Some(polars::prelude::TimeZone::UTC),
        ))?;

        DataFrame::new(vec![
            timestamp_series.into(),
            Series::new("value_raw".into(), self.raw.clone()).into(),
            Series::new("value_in_range".into(), self.in_range.clone()).into(),
            Series::new("value_despiked".into(), self.despiked.clone()).into(),
            Series::new("cleaned".into(), self.cleaned.clone()).into(),
        ])
    }
}

use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sensorclean_core::ingestion::read_csv_records;
use sensorclean_core::outputs::{write_csv, write_json};
use sensorclean_core::{
    clean_records, clean_series, run_stages, CleanedSample, CleaningConfig, RawRecord, Sample,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn series(values: &[f64]) -> Vec<Sample> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Sample::new(base_time() + Duration::minutes(10 * i as i64), Some(*v)))
        .collect()
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

#[test]
fn output_is_sorted_and_ties_keep_input_order() -> Result<()> {
    let records = vec![
        RawRecord::new("2025-06-01T00:20:00Z", 0.40),
        RawRecord::new("2025-06-01T00:10:00Z", 0.21),
        RawRecord::new("2025-06-01T00:00:00Z", 0.10),
        RawRecord::new("2025-06-01T00:10:00Z", 0.22),
    ];

    let outcome = clean_records(&records, &CleaningConfig::default())?;
    let times: Vec<DateTime<Utc>> = outcome.samples.iter().map(|s| s.timestamp).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);

    // Four rows: both filters are no-ops, so the tie order is visible in the values.
    let values: Vec<Option<f64>> = outcome.samples.iter().map(|s| s.cleaned).collect();
    assert_eq!(values, vec![Some(0.10), Some(0.21), Some(0.22), Some(0.40)]);
    Ok(())
}

#[test]
fn out_of_range_values_never_survive() {
    let raw = [
        0.30, 0.31, -0.05, 0.30, 0.29, 0.72, 0.31, 0.30, 1.50, 0.32, 0.31, 0.30,
    ];
    let cleaned = clean_series(&series(&raw), &CleaningConfig::default());
    assert_eq!(cleaned.len(), raw.len());

    for (idx, value) in raw.iter().enumerate() {
        if *value < 0.0 || *value > 0.60 {
            let output = cleaned[idx].cleaned.expect("gap should be filled");
            assert_ne!(output, *value);
            assert!((0.0..=0.60).contains(&output), "index {idx}: {output}");
        }
    }
}

#[test]
fn out_of_range_values_in_short_series_stay_missing() {
    let cleaned = clean_series(&series(&[0.3, 0.9, 0.31]), &CleaningConfig::default());
    assert_eq!(cleaned[1].cleaned, None);
    assert_eq!(cleaned[0].cleaned, Some(0.3));
}

#[test]
fn linear_series_passes_through_unchanged() {
    let raw: Vec<f64> = (0..20).map(|i| 0.1 + 0.001 * i as f64).collect();
    let cleaned = clean_series(&series(&raw), &CleaningConfig::default());

    for (input, output) in raw.iter().zip(&cleaned) {
        let output = output.cleaned.expect("linear data has no gaps");
        assert!((input - output).abs() < 1e-6, "{input} vs {output}");
    }
}

#[test]
fn single_spike_is_corrected_end_to_end() {
    let mut raw = vec![0.30; 10];
    raw[5] = 0.95;

    let stages = run_stages(&series(&raw), &CleaningConfig::default());
    assert_eq!(stages.in_range[5], None);
    assert_eq!(stages.despiked[5], Some(0.30));
    assert_eq!(stages.smoothing_window, Some(9));

    let value = stages.cleaned[5].expect("spike should be replaced");
    assert!((value - 0.30).abs() < 1e-9);
}

#[test]
fn empty_series_yields_empty_output() -> Result<()> {
    let config = CleaningConfig::default();
    assert!(clean_series(&[], &config).is_empty());

    let outcome = clean_records(&[], &config)?;
    assert!(outcome.samples.is_empty());
    assert_eq!(outcome.summary.rows, 0);
    assert!(!outcome.summary.despike_applied);
    assert_eq!(outcome.summary.smoothing_window, None);

    let df = run_stages(&[], &config).to_dataframe()?;
    assert_eq!(df.height(), 0);
    Ok(())
}

#[test]
fn csv_fixture_is_cleaned_and_summarised() -> Result<()> {
    let records = read_csv_records(File::open(fixture_path("soil_moisture.csv"))?)?;
    let outcome = clean_records(&records, &CleaningConfig::default())?;

    assert_eq!(outcome.ingestion.accepted, 11);
    assert_eq!(outcome.samples.len(), 11);
    assert_eq!(outcome.summary.out_of_range, 2);
    assert_eq!(outcome.summary.gaps_filled, 2);
    assert_eq!(outcome.summary.spikes_corrected, 0);
    assert_eq!(outcome.summary.unresolved_missing, 0);
    assert_eq!(outcome.summary.smoothing_window, Some(11));

    for sample in &outcome.samples {
        let value = sample.cleaned.expect("all positions resolved");
        assert!((0.28..=0.34).contains(&value), "{value}");
    }
    Ok(())
}

#[test]
fn stage_frame_has_one_column_per_stage() -> Result<()> {
    let mut raw = vec![0.30; 8];
    raw[2] = 0.80;
    let df = run_stages(&series(&raw), &CleaningConfig::default()).to_dataframe()?;

    assert_eq!(df.height(), 8);
    for name in [
        "timestamp_utc",
        "value_raw",
        "value_in_range",
        "value_despiked",
        "cleaned",
    ] {
        assert!(df.column(name).is_ok(), "missing column {name}");
    }
    assert_eq!(df.column("value_raw")?.null_count(), 0);
    assert_eq!(df.column("value_in_range")?.null_count(), 1);
    assert_eq!(df.column("cleaned")?.null_count(), 0);
    Ok(())
}

#[test]
fn csv_output_writes_missing_as_empty_field() -> Result<()> {
    let samples = vec![
        CleanedSample {
            timestamp: base_time(),
            cleaned: Some(0.3),
        },
        CleanedSample {
            timestamp: base_time() + Duration::minutes(10),
            cleaned: None,
        },
    ];

    let mut buffer = Vec::new();
    write_csv(&mut buffer, &samples)?;
    let text = String::from_utf8(buffer)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "_time,cleaned");
    assert_eq!(lines[1], "2025-06-01T00:00:00Z,0.3");
    assert_eq!(lines[2], "2025-06-01T00:10:00Z,");

    let mut empty = Vec::new();
    write_csv(&mut empty, &[])?;
    assert_eq!(String::from_utf8(empty)?.trim(), "_time,cleaned");
    Ok(())
}

#[test]
fn json_output_uses_null_for_missing() -> Result<()> {
    let samples = vec![CleanedSample {
        timestamp: base_time(),
        cleaned: None,
    }];

    let mut buffer = Vec::new();
    write_json(&mut buffer, &samples)?;
    let value: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(value[0]["_time"], "2025-06-01T00:00:00Z");
    assert!(value[0]["cleaned"].is_null());
    Ok(())
}

#[test]
fn stage_frame_round_trips_through_parquet() -> Result<()> {
    use polars::prelude::{ParquetReader, SerReader};
    use sensorclean_core::outputs::write_parquet;

    let mut raw = vec![0.25; 9];
    raw[4] = 0.9;
    let df = run_stages(&series(&raw), &CleaningConfig::default()).to_dataframe()?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stages.parquet");
    write_parquet(&path, &df)?;

    let restored = ParquetReader::new(File::open(&path)?).finish()?;
    assert_eq!(restored.height(), 9);
    assert_eq!(restored.column("value_in_range")?.null_count(), 1);
    Ok(())
}

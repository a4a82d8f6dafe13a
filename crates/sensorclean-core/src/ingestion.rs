use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CleaningError, Result};
use crate::types::Sample;

pub const TIME_FIELD: &str = "_time";
pub const VALUE_FIELD: &str = "_value";

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A field as it arrives on the wire: JSON number or any string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
}

/// One unvalidated input row. Extra keys in the source object are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecordKeys")]
pub struct RawRecord {
    #[serde(rename = "_time")]
    pub time: Option<RawField>,
    #[serde(rename = "_value")]
    pub value: Option<RawField>,
}

/// Both spellings of each field as they may appear in one object.
#[derive(Deserialize)]
struct RawRecordKeys {
    #[serde(rename = "_time")]
    time: Option<RawField>,
    #[serde(rename = "time")]
    time_alias: Option<RawField>,
    #[serde(rename = "_value")]
    value: Option<RawField>,
    #[serde(rename = "value")]
    value_alias: Option<RawField>,
}

impl From<RawRecordKeys> for RawRecord {
    /// The underscored key wins when both spellings carry a value.
    fn from(keys: RawRecordKeys) -> Self {
        Self {
            time: keys.time.or(keys.time_alias),
            value: keys.value.or(keys.value_alias),
        }
    }
}

impl RawRecord {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: Some(RawField::Text(time.into())),
            value: Some(RawField::Number(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub received: usize,
    pub accepted: usize,
    pub invalid_timestamps: usize,
    pub invalid_values: usize,
}

impl IngestionReport {
    pub fn dropped(&self) -> usize {
        self.invalid_timestamps + self.invalid_values
    }
}

#[derive(Debug, Clone)]
pub struct IngestedBatch {
    pub samples: Vec<Sample>,
    pub report: IngestionReport,
}

/// Turns raw rows into a timestamp-ordered series.
///
/// Rows whose timestamp cannot be read, or whose value is text that is not a
/// number, are dropped and counted. A row without a value is kept as a missing
/// sample. Ties keep their input order.
pub fn ingest_records(records: &[RawRecord]) -> Result<IngestedBatch> {
    let mut report = IngestionReport {
        received: records.len(),
        ..Default::default()
    };

    if !records.is_empty() {
        if records.iter().all(|record| record.time.is_none()) {
            return Err(CleaningError::MissingField(TIME_FIELD));
        }
        if records.iter().all(|record| record.value.is_none()) {
            return Err(CleaningError::MissingField(VALUE_FIELD));
        }
    }

    let mut samples = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let Some(timestamp) = record.time.as_ref().and_then(parse_timestamp) else {
            debug!(row = index, "dropping row with unreadable timestamp");
            report.invalid_timestamps += 1;
            continue;
        };

        let value = match record.value.as_ref() {
            None => None,
            Some(field) => match parse_value(field) {
                Some(value) => Some(value),
                None => {
                    debug!(row = index, "dropping row with non-numeric value");
                    report.invalid_values += 1;
                    continue;
                }
            },
        };

        samples.push(Sample::new(timestamp, value));
    }

    samples.sort_by_key(|sample| sample.timestamp);
    report.accepted = samples.len();

    if report.dropped() > 0 {
        warn!(
            received = report.received,
            invalid_timestamps = report.invalid_timestamps,
            invalid_values = report.invalid_values,
            "dropped malformed rows during ingestion"
        );
    }

    Ok(IngestedBatch { samples, report })
}

/// Accepts RFC 3339 (any offset, normalised to UTC) or a naive date/time read as UTC.
pub fn parse_timestamp(field: &RawField) -> Option<DateTime<Utc>> {
    let RawField::Text(text) = field else {
        return None;
    };
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Numeric coercion of a value field. Non-finite results are kept here and
/// become missing in the range filter.
pub fn parse_value(field: &RawField) -> Option<f64> {
    match field {
        RawField::Number(value) => Some(*value),
        RawField::Text(text) => text.trim().parse::<f64>().ok(),
    }
}

/// Reads a CSV export with a header row naming the time and value columns.
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_FIELD, "time");
    let value_idx = column_index(&headers, VALUE_FIELD, "value");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let text_at = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .filter(|cell| !cell.is_empty())
                .map(|cell| RawField::Text(cell.to_string()))
        };
        records.push(RawRecord {
            time: text_at(time_idx),
            value: text_at(value_idx),
        });
    }

    Ok(records)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonBatch {
    Envelope { data: Vec<RawRecord> },
    Bare(Vec<RawRecord>),
}

/// Reads either `{"data": [...]}` or a bare JSON array of records.
pub fn read_json_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let batch: JsonBatch = serde_json::from_reader(reader)?;
    Ok(match batch {
        JsonBatch::Envelope { data } => data,
        JsonBatch::Bare(records) => records,
    })
}

fn column_index(headers: &csv::StringRecord, primary: &str, alias: &str) -> Option<usize> {
    headers
        .iter()
        .position(|name| name == primary)
        .or_else(|| headers.iter().position(|name| name.eq_ignore_ascii_case(alias)))
}

// crates/sensorclean-core/src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading after ingestion. `None` marks a missing value; the position is
/// kept so timestamps stay aligned across every stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// Wire shape of a cleaned reading: `{"_time": "...", "cleaned": 0.31}`.
///
/// A value that is still missing after the last stage serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedSample {
    #[serde(rename = "_time")]
    pub timestamp: DateTime<Utc>,
    pub cleaned: Option<f64>,
}

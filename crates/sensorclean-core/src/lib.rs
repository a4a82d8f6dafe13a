pub mod config;
pub mod despike;
pub mod error;
pub mod ingestion;
pub mod outputs;
pub mod pipeline;
pub mod range_filter;
pub mod smoother;
pub mod types;

pub use config::CleaningConfig;
pub use error::{CleaningError, Result};
pub use ingestion::{ingest_records, IngestedBatch, IngestionReport, RawField, RawRecord};
pub use pipeline::{
    clean_records, clean_series, run_stages, CleaningOutcome, CleaningSummary, StageOutputs,
};
pub use types::{CleanedSample, Sample};

// crates/sensorclean-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("no record in the batch carries a `{0}` field")]
    MissingField(&'static str),

    #[error("invalid cleaning configuration: {0}")]
    InvalidConfig(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl CleaningError {
    /// True for errors caused by the caller's input rather than by the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CleaningError::MissingField(_) | CleaningError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CleaningError>;

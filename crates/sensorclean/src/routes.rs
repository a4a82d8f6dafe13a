use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sensorclean_core::{clean_records, CleanedSample, CleaningError, RawRecord};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CleanRequest {
    pub data: Vec<RawRecord>,
}

pub enum ApiError {
    Cleaning(CleaningError),
    InvalidBody(serde_json::Error),
}

impl From<CleaningError> for ApiError {
    fn from(err: CleaningError) -> Self {
        Self::Cleaning(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidBody(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ApiError::Cleaning(err) if err.is_client_error() => {
                warn!("rejected cleaning request: {err}");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Cleaning(err) => {
                error!("cleaning request failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub async fn clean(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<CleanedSample>>, ApiError> {
    let fingerprint = batch_fingerprint(&body);
    let payload: CleanRequest = serde_json::from_slice(&body).map_err(|err| {
        warn!(batch = %fingerprint, "request body is not a cleaning batch: {err}");
        ApiError::InvalidBody(err)
    })?;
    let outcome = clean_records(&payload.data, &app_state.config)?;

    info!(
        batch = %fingerprint,
        received = outcome.ingestion.received,
        dropped = outcome.ingestion.dropped(),
        rows = outcome.summary.rows,
        spikes_corrected = outcome.summary.spikes_corrected,
        gaps_filled = outcome.summary.gaps_filled,
        "served /clean"
    );

    Ok(Json(outcome.samples))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Short blake3 hash of the request body as received, used to correlate log lines.
pub fn batch_fingerprint(body: &[u8]) -> String {
    let hash = blake3::hash(body).to_hex();
    hash.as_str()[..16].to_string()
}

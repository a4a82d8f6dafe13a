use sensorclean_core::CleaningConfig;

/// Shared, read-only request context. Cleaning keeps no state between requests.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: CleaningConfig,
}

impl AppState {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }
}

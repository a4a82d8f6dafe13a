use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CleaningError, Result};

/// Lowest physically plausible reading. Anything below is marked missing.
pub const DEFAULT_RANGE_LOW: f64 = 0.0;
/// Highest physically plausible reading. Anything above is marked missing.
pub const DEFAULT_RANGE_HIGH: f64 = 0.60;
/// Width of the centered rolling-median window used by the despiker.
pub const DEFAULT_DESPIKE_WINDOW: usize = 5;
/// Maximum allowed distance from the local median before a value is a spike.
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.20;
/// Degree of the local least-squares polynomial.
pub const DEFAULT_POLY_ORDER: usize = 2;
/// Shortest series the smoother will touch. Must be odd and exceed the degree.
pub const DEFAULT_MIN_SMOOTHING_WINDOW: usize = 7;

/// Fixed parameters of the cleaning pipeline.
///
/// The defaults are the reference thresholds for volumetric soil-moisture
/// sensors. A TOML file may override any subset of the keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    pub range_low: f64,
    pub range_high: f64,
    pub despike_window: usize,
    pub spike_threshold: f64,
    pub poly_order: usize,
    pub min_smoothing_window: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            range_low: DEFAULT_RANGE_LOW,
            range_high: DEFAULT_RANGE_HIGH,
            despike_window: DEFAULT_DESPIKE_WINDOW,
            spike_threshold: DEFAULT_SPIKE_THRESHOLD,
            poly_order: DEFAULT_POLY_ORDER,
            min_smoothing_window: DEFAULT_MIN_SMOOTHING_WINDOW,
        }
    }
}

impl CleaningConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: CleaningConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.range_low.is_finite() || !self.range_high.is_finite() {
            return Err(invalid("range bounds must be finite"));
        }
        if self.range_low > self.range_high {
            return Err(invalid(format!(
                "range_low {} is above range_high {}",
                self.range_low, self.range_high
            )));
        }
        if !self.spike_threshold.is_finite() || self.spike_threshold < 0.0 {
            return Err(invalid("spike_threshold must be a finite, non-negative number"));
        }
        if self.despike_window == 0 || self.despike_window % 2 == 0 {
            return Err(invalid(format!(
                "despike_window must be odd, got {}",
                self.despike_window
            )));
        }
        if self.min_smoothing_window % 2 == 0 {
            return Err(invalid(format!(
                "min_smoothing_window must be odd, got {}",
                self.min_smoothing_window
            )));
        }
        if self.min_smoothing_window <= self.poly_order {
            return Err(invalid(format!(
                "min_smoothing_window {} must exceed poly_order {}",
                self.min_smoothing_window, self.poly_order
            )));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| CleaningError::InvalidConfig(err.to_string()))
    }
}

fn invalid(message: impl Into<String>) -> CleaningError {
    CleaningError::InvalidConfig(message.into())
}

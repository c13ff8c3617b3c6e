use std::path::Path;

use sankeyfin_import::{NormalizeOptions, DEFAULT_HEADER_ROW_INDEX};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_THRESHOLD: f64 = 1000.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Session settings. Every key is optional in the TOML file.
///
/// ```toml
/// threshold = 250.0
/// header_row_index = 4
/// detect_date_ranges = true
/// sheet = "Transactions"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Top-level categories totalling less than this collapse into "Other".
    pub threshold: f64,
    /// Zero-based header row for spreadsheet sources.
    pub header_row_index: usize,
    pub detect_date_ranges: bool,
    /// Worksheet to read; the first one when unset.
    pub sheet: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            header_row_index: DEFAULT_HEADER_ROW_INDEX,
            detect_date_ranges: true,
            sheet: None,
        }
    }
}

impl SessionConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let mut config: SessionConfig = toml::from_str(toml_content)?;
        config.threshold = sanitize_threshold(config.threshold);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            header_row_index: self.header_row_index,
            detect_date_ranges: self.detect_date_ranges,
        }
    }
}

/// Negative or non-finite thresholds fall back to the default; zero is kept
/// and disables grouping.
pub fn sanitize_threshold(threshold: f64) -> f64 {
    if threshold.is_finite() && threshold >= 0.0 {
        threshold
    } else {
        DEFAULT_THRESHOLD
    }
}

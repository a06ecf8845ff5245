//! Configuration for datatable-core
//!
//! Histogram bin defaults and which statistics a table maintains.

use serde::{Deserialize, Serialize};

/// Table-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTableConfig {
    /// Bin count used before any data is loaded
    pub default_num_histogram_bins: usize,
    /// Upper bound on the bin count derived from the row count
    pub max_num_histogram_bins: usize,
    /// Maintain statistics for the queried subset
    pub calculate_query_statistics: bool,
    /// Maintain statistics for the complement of the queried subset
    pub calculate_non_query_statistics: bool,
    /// Maintain joint histograms for every pair of binnable columns
    pub calculate_histogram2d: bool,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            default_num_histogram_bins: 50,
            max_num_histogram_bins: 100,
            calculate_query_statistics: true,
            calculate_non_query_statistics: false,
            calculate_histogram2d: true,
        }
    }
}

impl DataTableConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    #[cfg(feature = "toml-config")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    #[cfg(feature = "toml-config")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Bin count for a freshly loaded table of `row_count` rows:
    /// `floor(sqrt(n))`, at least one, at most `max_num_histogram_bins`
    pub fn bins_for_row_count(&self, row_count: usize) -> usize {
        if row_count == 0 {
            return self.default_num_histogram_bins;
        }
        let bins = (row_count as f64).sqrt().floor() as usize;
        bins.clamp(1, self.max_num_histogram_bins.max(1))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_num_histogram_bins == 0 {
            return Err(ConfigError::OutOfRange(
                "default_num_histogram_bins must be positive".to_string(),
            ));
        }

        if self.max_num_histogram_bins == 0 {
            return Err(ConfigError::OutOfRange(
                "max_num_histogram_bins must be positive".to_string(),
            ));
        }

        if self.default_num_histogram_bins > self.max_num_histogram_bins {
            return Err(ConfigError::InvalidBinLimits(format!(
                "default ({}) exceeds max ({})",
                self.default_num_histogram_bins, self.max_num_histogram_bins
            )));
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Bin limits are inconsistent with each other
    InvalidBinLimits(String),
    /// Value is out of valid range
    OutOfRange(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidBinLimits(msg) => write!(f, "Invalid bin limits: {}", msg),
            ConfigError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DataTableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_num_histogram_bins, 50);
        assert_eq!(config.max_num_histogram_bins, 100);
    }

    #[test]
    fn test_json_serialization() {
        let mut config = DataTableConfig::default();
        config.calculate_non_query_statistics = true;
        let json = config.to_json().unwrap();
        let parsed = DataTableConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed = DataTableConfig::from_json(r#"{"max_num_histogram_bins": 64}"#).unwrap();
        assert_eq!(parsed.max_num_histogram_bins, 64);
        assert_eq!(parsed.default_num_histogram_bins, 50);
    }

    #[test]
    fn test_bins_for_row_count() {
        let config = DataTableConfig::default();
        assert_eq!(config.bins_for_row_count(0), 50);
        assert_eq!(config.bins_for_row_count(5), 2);
        assert_eq!(config.bins_for_row_count(1), 1);
        assert_eq!(config.bins_for_row_count(1_000_000), 100);
    }

    #[test]
    fn test_invalid_bin_limits() {
        let mut config = DataTableConfig::default();
        config.default_num_histogram_bins = 200;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBinLimits(_))));

        config.default_num_histogram_bins = 0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_round_trip() {
        let config = DataTableConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(DataTableConfig::from_toml(&toml_str).unwrap(), config);
    }
}

//! Pipeline configuration
//!
//! Holds the two tunables of a run: the side length of the embedded
//! thumbnails and the relative margin kept free around normalized
//! coordinates. Values come from defaults, the environment or a TOML file
//! and are passed explicitly to every entry point.

use std::env;
use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::errors::{FeatureError, FeatureResult};

/// Default thumbnail side length in pixels
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 64;

/// Default relative margin for display-range normalization
pub const DEFAULT_MARGIN: f64 = 0.2;

/// Environment variable overriding the thumbnail side length
pub const THUMBNAIL_SIZE_ENV: &str = "THUMBNAIL_SIZE";

/// Environment variable overriding the normalization margin
pub const MARGIN_ENV: &str = "FEATURESCOPE_MARGIN";

/// Configuration shared by all row sources of one run
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Side length of the square letterboxed thumbnails
    pub thumbnail_size: u32,
    /// Fraction of the [0, 1] display range left as border
    pub margin: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl PipelineConfig {
    /// Create a validated configuration
    pub fn new(thumbnail_size: u32, margin: f64) -> FeatureResult<Self> {
        let config = PipelineConfig { thumbnail_size, margin };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from the defaults overridden by the environment
    ///
    /// Unset variables fall back to the defaults; set but unparsable
    /// values are an error rather than being silently ignored.
    pub fn from_env() -> FeatureResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `THUMBNAIL_SIZE` and `FEATURESCOPE_MARGIN` on top of `self`
    pub fn with_env_overrides(mut self) -> FeatureResult<Self> {
        if let Ok(raw) = env::var(THUMBNAIL_SIZE_ENV) {
            self.thumbnail_size = raw.trim().parse::<u32>().map_err(|_| {
                FeatureError::InvalidConfig(format!("{} must be a positive integer, got '{}'", THUMBNAIL_SIZE_ENV, raw))
            })?;
            debug!("Thumbnail size from environment: {}", self.thumbnail_size);
        }
        if let Ok(raw) = env::var(MARGIN_ENV) {
            self.margin = raw.trim().parse::<f64>().map_err(|_| {
                FeatureError::InvalidConfig(format!("{} must be a number, got '{}'", MARGIN_ENV, raw))
            })?;
            debug!("Margin from environment: {}", self.margin);
        }
        self.validate()?;
        Ok(self)
    }

    /// Load a configuration from a TOML file; missing keys keep their defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> FeatureResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FeatureError::NotFound { path: path.to_path_buf() });
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> FeatureResult<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants of both tunables
    pub fn validate(&self) -> FeatureResult<()> {
        if self.thumbnail_size == 0 {
            return Err(FeatureError::InvalidConfig("thumbnail_size must be greater than 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.margin) {
            return Err(FeatureError::InvalidConfig(format!("margin must lie in [0, 1), got {}", self.margin)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.thumbnail_size, 64);
        assert_eq!(config.margin, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = PipelineConfig::from_toml_str("thumbnail_size = 32\n").unwrap();
        assert_eq!(config.thumbnail_size, 32);
        assert_eq!(config.margin, DEFAULT_MARGIN);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        assert!(PipelineConfig::from_toml_str("size = 32\n").is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(PipelineConfig::new(0, 0.2).is_err());
        assert!(PipelineConfig::new(64, 1.0).is_err());
        assert!(PipelineConfig::new(64, -0.1).is_err());
        assert!(PipelineConfig::new(16, 0.0).is_ok());
    }
}

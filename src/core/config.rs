//! Configuration for the shard loader
//!
//! A `LoaderConfig` says where the manifest and shard files live and how the
//! ingestion work is sliced. It can be built in code, deserialized from JSON,
//! or picked from a `LoadingProfile` preset.

use crate::core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_DATA_BASE, DEFAULT_MANIFEST, ERROR_NOTIFICATION_MS, USER_AGENT,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadingProfile {
    /// Default cadence: 500 features per batch.
    Balanced,
    /// Smaller batches for slow devices.
    Responsive,
    /// Larger batches when input latency matters less than load time.
    Throughput,
    Custom(LoaderConfig),
}

impl LoadingProfile {
    pub fn resolve(&self) -> LoaderConfig {
        match self {
            Self::Balanced => LoaderConfig::default(),
            Self::Responsive => LoaderConfig {
                batch_size: 200,
                ..LoaderConfig::default()
            },
            Self::Throughput => LoaderConfig {
                batch_size: 2_000,
                ..LoaderConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for LoadingProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// URL or path of the manifest (`districts_index.json`)
    pub manifest: String,
    /// URL or directory the manifest's shard filenames are relative to
    pub data_base: String,
    /// Features per batch handed to the rendering layer
    pub batch_size: usize,
    /// How long a non-fatal error notification stays visible
    pub error_display_ms: u64,
    /// User-Agent for HTTP sources
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            manifest: DEFAULT_MANIFEST.to_string(),
            data_base: DEFAULT_DATA_BASE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            error_display_ms: ERROR_NOTIFICATION_MS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Parse a JSON config. Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LoaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than zero".into()));
        }
        if self.manifest.trim().is_empty() {
            return Err(Error::Config("manifest location is empty".into()));
        }
        Ok(())
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn with_data_base(mut self, data_base: impl Into<String>) -> Self {
        self.data_base = data_base.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.error_display(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
        assert_eq!(LoadingProfile::default().resolve(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            LoaderConfig::from_json_str(r#"{"manifest": "https://example.org/index.json"}"#)
                .unwrap();
        assert_eq!(config.manifest, "https://example.org/index.json");
        assert_eq!(config.data_base, DEFAULT_DATA_BASE);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = LoaderConfig::from_json_str(r#"{"batch_size": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(LoaderConfig::default().with_manifest("  ").validate().is_err());
    }

    #[test]
    fn test_profiles() {
        assert_eq!(LoadingProfile::Responsive.resolve().batch_size, 200);
        assert_eq!(LoadingProfile::Throughput.resolve().batch_size, 2_000);
        let custom = LoaderConfig::default().with_batch_size(42);
        assert_eq!(LoadingProfile::Custom(custom).resolve().batch_size, 42);
    }
}

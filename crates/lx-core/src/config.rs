//! Configuration types and loading
//!
//! Values come from `Default` and can be overridden from the environment.

use serde::{Deserialize, Serialize};

/// One kibibyte
pub const KIB: u64 = 1024;
/// One mebibyte
pub const MIB: u64 = 1024 * KIB;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Upload limits and preview settings
    pub assets: AssetConfig,

    /// Blob store settings
    pub storage: StorageConfig,
}

/// Limits applied to candidate files
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AssetConfig {
    /// Largest accepted file, checked at selection and upload time
    pub max_upload_bytes: u64,
    /// Smallest accepted file, checked at upload time only
    pub min_upload_bytes: u64,
    /// Media type family a file must belong to (`image`)
    pub accepted_family: String,
    /// Files above this size get no inline preview
    pub max_preview_bytes: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 5 * MIB,
            min_upload_bytes: KIB,
            accepted_family: "image".to_string(),
            max_preview_bytes: 5 * MIB,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root directory of the local blob store
    pub local_path: String,
    /// Public prefix of retrieval locators
    pub public_base_url: String,
    /// Bytes written between two progress events
    pub transfer_chunk_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "./var/assets".to_string(),
            public_base_url: "http://localhost:8080/assets".to_string(),
            transfer_chunk_bytes: 256 * 1024,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

impl From<ConfigError> for crate::error::LxError {
    fn from(err: ConfigError) -> Self {
        crate::error::LxError::Config(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("LEXPORTAL_MAX_UPLOAD_BYTES") {
            config.assets.max_upload_bytes = parse_number("LEXPORTAL_MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("LEXPORTAL_MIN_UPLOAD_BYTES") {
            config.assets.min_upload_bytes = parse_number("LEXPORTAL_MIN_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("LEXPORTAL_MAX_PREVIEW_BYTES") {
            config.assets.max_preview_bytes = parse_number("LEXPORTAL_MAX_PREVIEW_BYTES", &v)?;
        }

        // Storage
        if let Some(path) = lookup("LEXPORTAL_STORAGE_PATH") {
            config.storage.local_path = path;
        }
        if let Some(url) = lookup("LEXPORTAL_PUBLIC_BASE_URL") {
            config.storage.public_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("LEXPORTAL_TRANSFER_CHUNK_BYTES") {
            let chunk: u64 = parse_number("LEXPORTAL_TRANSFER_CHUNK_BYTES", &v)?;
            if chunk == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "LEXPORTAL_TRANSFER_CHUNK_BYTES".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.storage.transfer_chunk_bytes = chunk as usize;
        }

        config.check()?;
        Ok(config)
    }

    /// Reject limit combinations that would refuse every file
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.assets.min_upload_bytes > self.assets.max_upload_bytes {
            return Err(ConfigError::Inconsistent(format!(
                "minimum upload size {} exceeds maximum {}",
                self.assets.min_upload_bytes, self.assets.max_upload_bytes
            )));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.assets.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.assets.min_upload_bytes, 1024);
        assert_eq!(config.assets.accepted_family, "image");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LEXPORTAL_MAX_UPLOAD_BYTES", "2048"),
            ("LEXPORTAL_PUBLIC_BASE_URL", "https://cdn.example.com/assets/"),
            ("LEXPORTAL_TRANSFER_CHUNK_BYTES", "512"),
        ]))
        .unwrap();

        assert_eq!(config.assets.max_upload_bytes, 2048);
        assert_eq!(config.storage.public_base_url, "https://cdn.example.com/assets");
        assert_eq!(config.storage.transfer_chunk_bytes, 512);
    }

    #[test]
    fn test_invalid_number() {
        let result = AppConfig::from_lookup(lookup(&[("LEXPORTAL_MIN_UPLOAD_BYTES", "lots")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_inconsistent_limits() {
        let result = AppConfig::from_lookup(lookup(&[
            ("LEXPORTAL_MIN_UPLOAD_BYTES", "4096"),
            ("LEXPORTAL_MAX_UPLOAD_BYTES", "1024"),
        ]));
        assert!(matches!(result, Err(ConfigError::Inconsistent(_))));
    }
}

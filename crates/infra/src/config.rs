//! Configuration loading and representation.

use url::Url;

use gpsrhub_core::ConfigError;

const DEFAULT_BUCKET: &str = "product-files";

/// Where uploaded files become publicly reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub public_base_url: Url,
    pub bucket: String,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `STORAGE_PUBLIC_BASE_URL` (required)
    /// - `STORAGE_BUCKET` (default: `product-files`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup("STORAGE_PUBLIC_BASE_URL").ok_or(ConfigError::Missing("STORAGE_PUBLIC_BASE_URL"))?;
        let public_base_url = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidUrl("STORAGE_PUBLIC_BASE_URL", e.to_string()))?;
        if public_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                "STORAGE_PUBLIC_BASE_URL",
                format!("{raw} cannot be a base URL"),
            ));
        }

        let bucket = lookup("STORAGE_BUCKET")
            .map(|b| b.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        if bucket.is_empty() || bucket.contains('/') {
            return Err(ConfigError::Invalid("STORAGE_BUCKET", bucket));
        }

        Ok(Self {
            public_base_url,
            bucket,
        })
    }
}

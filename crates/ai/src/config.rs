//! Compliance checker configuration.

use url::Url;

use gpsrhub_core::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Full URL of the completion endpoint.
    pub endpoint: Url,
    pub timeout_secs: u64,
    pub max_image_bytes: usize,
}

impl CheckerConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `COMPLIANCE_CHECK_URL` (required)
    /// - `COMPLIANCE_CHECK_TIMEOUT_SECS` (default: 60)
    /// - `COMPLIANCE_CHECK_MAX_IMAGE_BYTES` (default: 5 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup("COMPLIANCE_CHECK_URL").ok_or(ConfigError::Missing("COMPLIANCE_CHECK_URL"))?;
        let endpoint = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidUrl("COMPLIANCE_CHECK_URL", e.to_string()))?;

        Ok(Self {
            endpoint,
            timeout_secs: number(&lookup, "COMPLIANCE_CHECK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            max_image_bytes: number(
                &lookup,
                "COMPLIANCE_CHECK_MAX_IMAGE_BYTES",
                DEFAULT_MAX_IMAGE_BYTES,
            )?,
        })
    }
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
    }
}

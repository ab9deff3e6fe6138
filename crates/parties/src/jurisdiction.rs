//! Country codes and the markets they belong to.

use serde::{Deserialize, Serialize};

use gpsrhub_core::DomainError;

/// ISO 3166-1 alpha-2 country code, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

/// Market a representative can act for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// EU member states plus the EEA countries that apply GPSR.
    Eu,
    /// Great Britain and Northern Ireland (UKCA).
    Uk,
}

const EU_EEA: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE", "IS", "LI", "NO",
];

impl CountryCode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim().to_ascii_uppercase();
        // Common shorthand; ISO uses GB for the United Kingdom.
        let code = if code == "UK" { "GB".to_string() } else { code };
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "country must be a two-letter ISO code, got '{}'",
                raw.trim()
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn market(&self) -> Option<Market> {
        if self.0 == "GB" {
            Some(Market::Uk)
        } else if EU_EEA.contains(&self.0.as_str()) {
            Some(Market::Eu)
        } else {
            None
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

impl core::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uk_alias_maps_to_gb() {
        let code = CountryCode::parse(" uk ").unwrap();
        assert_eq!(code.as_str(), "GB");
        assert_eq!(code.market(), Some(Market::Uk));
    }

    #[test]
    fn eea_members_count_as_eu_market() {
        assert_eq!(CountryCode::parse("no").unwrap().market(), Some(Market::Eu));
        assert_eq!(CountryCode::parse("DE").unwrap().market(), Some(Market::Eu));
        assert_eq!(CountryCode::parse("CH").unwrap().market(), None);
        assert_eq!(CountryCode::parse("US").unwrap().market(), None);
    }

    #[test]
    fn rejects_non_iso_values() {
        assert!(CountryCode::parse("Germany").is_err());
        assert!(CountryCode::parse("D1").is_err());
        assert!(CountryCode::parse("").is_err());
    }
}

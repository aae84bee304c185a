//! Configuration for the counter engine
//!
//! TOML-loadable settings with serde defaults. The zone configured here is
//! only the default for mutation bucket resolution; queries always carry
//! their zone explicitly.

use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Engine configuration
///
/// # Example
///
/// ```rust
/// use tally_store::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str(r#"
/// default_zone = "Europe/Moscow"
/// max_series_len = 5000
/// "#).unwrap();
/// assert_eq!(config.max_series_len, 5000);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// IANA zone name used for mutation bucket resolution
    #[serde(default = "default_zone")]
    pub default_zone: String,

    /// Maximum number of buckets a single query may report
    #[serde(default = "default_max_series_len")]
    pub max_series_len: usize,
}

fn default_zone() -> String {
    "UTC".to_string()
}

fn default_max_series_len() -> usize {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_zone: default_zone(),
            max_series_len: default_max_series_len(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)
            .map_err(|e| Error::Configuration(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// The configured default zone, parsed
    pub fn zone(&self) -> Result<Tz> {
        Tz::from_str(&self.default_zone).map_err(|_| {
            Error::Configuration(format!("Unknown time zone '{}'", self.default_zone))
        })
    }

    /// Check the configuration for invalid values
    pub fn validate(&self) -> Result<()> {
        self.zone()?;
        if self.max_series_len == 0 {
            return Err(Error::Configuration(
                "max_series_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

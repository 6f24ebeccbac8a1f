//! Contract settings.
//!
//! # Responsibility
//! - Hold the alert threshold, the organization allowed to force alert
//!   rechecks, and the enumeration page size in one place.
//! - Load overrides from a TOML file; absent keys keep their defaults.
//!
//! # Invariants
//! - `threshold` is finite.
//! - `authorized_org` is non-empty.
//! - `scan_page_size >= 1`.

use crate::model::data_point::DEFAULT_ALERT_THRESHOLD;
use crate::state::DEFAULT_SCAN_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Organization allowed to run the consensus alert recheck by default.
pub const DEFAULT_AUTHORIZED_ORG: &str = "Org2";

/// Tunables shared by every data point operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractSettings {
    /// Alert when a temperature strictly exceeds this value (°C).
    pub threshold: f64,
    /// Only this caller organization may run the consensus recheck.
    pub authorized_org: String,
    /// Keys fetched per backend call during enumeration.
    pub scan_page_size: usize,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
            authorized_org: DEFAULT_AUTHORIZED_ORG.to_string(),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl ContractSettings {
    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a TOML settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.authorized_org.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "authorized_org cannot be empty".to_string(),
            ));
        }
        if self.scan_page_size == 0 {
            return Err(ConfigError::Invalid(
                "scan_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings toml: {err}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

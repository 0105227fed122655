//! CLI settings read from a TOML file.
//!
//! ```toml
//! default_year = "2024-25"
//! debounce_ms = 400
//!
//! [data]
//! backend = "csv"
//! location = "./tables"
//!
//! [engine]
//! living_expense_rate = 0.30
//!
//! [engine.expense_defaults]
//! agent_fee_rate = 0.055
//! ```
//!
//! Every key is optional. A missing file yields [`Settings::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tax_core::TaxYear;
use tax_core::calculations::EngineSettings;
use tax_core::db::DataSourceConfig;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SETTINGS_FILE: &str = "gearing.toml";

const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Year written into new scenarios. Falls back to the latest year the
    /// data source offers.
    pub default_year: Option<TaxYear>,
    pub data: DataSourceConfig,
    /// Quiet period before `watch` recomputes after an edit.
    pub debounce_ms: u64,
    pub engine: EngineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_year: None,
            data: DataSourceConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            engine: EngineSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(
        text: &str,
        path: &Path,
    ) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, or returns defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loading settings");
                Self::from_toml(&text, path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

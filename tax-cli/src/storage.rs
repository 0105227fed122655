//! JSON persistence of a [`ScenarioState`].
//!
//! The state file is the only thing the CLI owns between runs. Writes go to
//! a sibling temp file first and are renamed into place, so a watcher never
//! sees a half-written document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tax_core::ScenarioState;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot access state file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file '{path}' is not a valid scenario: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize scenario: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A scenario saved at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<ScenarioState, StorageError> {
        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut state: ScenarioState =
            serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;
        state.normalize_ids();
        Ok(state)
    }

    /// Writes `state` as pretty-printed JSON, replacing any previous file.
    pub fn save(
        &self,
        state: &ScenarioState,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(state).map_err(StorageError::Serialize)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, json)
            .and_then(|()| fs::rename(&temp_path, &self.path))
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            properties = state.properties.len(),
            "saved scenario"
        );
        Ok(())
    }

    /// Last modification time, or `None` if the file is currently missing.
    pub fn modified(&self) -> Result<Option<SystemTime>, StorageError> {
        match fs::metadata(&self.path) {
            Ok(meta) => meta.modified().map(Some).map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{NewProperty, RentalIncome, TaxYear};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn save_then_load_returns_same_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("scenario.json"));
        let mut state = ScenarioState::new(TaxYear::starting(2024));
        state.profile.gross_income = dec!(95000);
        state
            .add_property(NewProperty {
                name: "Carlton".to_string(),
                rental_income: RentalIncome::Weekly(dec!(610)),
                ..Default::default()
            })
            .unwrap();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn load_raises_stale_id_counter() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("scenario.json"));
        let mut state = ScenarioState::new(TaxYear::starting(2024));
        state.add_property(NewProperty::default()).unwrap();
        state.add_property(NewProperty::default()).unwrap();
        state.next_property_id = 1;
        store.save(&state).unwrap();

        let loaded = store.load().unwrap();

        assert_eq!(loaded.next_property_id, 3);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        let store = StateStore::new(&path);

        store.save(&ScenarioState::new(TaxYear::starting(2024))).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("absent.json"));

        assert!(matches!(store.load(), Err(StorageError::Io { .. })));
    }

    #[test]
    fn load_garbage_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        fs::write(&path, "{ not json").unwrap();

        let result = StateStore::new(&path).load();

        assert!(matches!(result, Err(StorageError::Parse { .. })));
    }

    #[test]
    fn modified_is_none_for_missing_file() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("absent.json"));

        assert_eq!(store.modified().unwrap(), None);
    }
}

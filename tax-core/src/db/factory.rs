use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::repository::{RepositoryError, TaxYearRepository};

/// Where tax tables come from.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `location` is passed through to that factory
/// unchanged; its meaning is backend-specific.
///
/// | backend   | location examples        |
/// |-----------|--------------------------|
/// | `builtin` | ignored                  |
/// | `csv`     | `./tax-tables` (a directory) |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"builtin"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub location: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            backend: "builtin".to_string(),
            location: String::new(),
        }
    }
}

/// One implementation per table source. Each data crate exports a unit
/// struct implementing this trait, registered with a [`RepositoryRegistry`]
/// at startup.
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Load the tables and return a ready-to-use repository.
    fn create(
        &self,
        config: &DataSourceConfig,
    ) -> Result<Box<dyn TaxYearRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] if no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub fn create(
        &self,
        config: &DataSourceConfig,
    ) -> Result<Box<dyn TaxYearRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config)
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

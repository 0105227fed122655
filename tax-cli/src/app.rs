use tax_core::calculations::{EngineSettings, FinancialReport, SnapshotError, recompute};
use tax_core::db::{DataSourceConfig, RepositoryRegistry};
use tax_core::{RepositoryError, TaxYear, TaxYearRepository};
use tax_data::{BuiltinFactory, CsvDirectoryFactory};
use thiserror::Error;
use tracing::debug;

use crate::storage::{StateStore, StorageError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Registry with every table source this binary knows about.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(BuiltinFactory));
    registry.register(Box::new(CsvDirectoryFactory));
    registry
}

pub fn open_repository(config: &DataSourceConfig) -> Result<Box<dyn TaxYearRepository>, RepositoryError> {
    debug!(backend = %config.backend, location = %config.location, "opening tax tables");
    build_registry().create(config)
}

/// `preferred` if given, otherwise the latest year the repository holds.
pub fn resolve_year(
    repository: &dyn TaxYearRepository,
    preferred: Option<TaxYear>,
) -> Result<TaxYear, RepositoryError> {
    if let Some(year) = preferred {
        return Ok(year);
    }
    repository
        .list_tax_years()?
        .into_iter()
        .max()
        .ok_or_else(|| RepositoryError::Configuration("no tax years available".to_string()))
}

/// Loads the scenario at `store` and recomputes it from scratch.
pub fn evaluate(
    repository: &dyn TaxYearRepository,
    store: &StateStore,
    settings: &EngineSettings,
) -> Result<FinancialReport, AppError> {
    let state = store.load()?;
    Ok(recompute(repository, &state, settings)?)
}

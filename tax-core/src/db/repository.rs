use thiserror::Error;

use crate::models::{TaxYear, TaxYearConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("no tax data for {0}")]
    NotFound(TaxYear),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Read access to per-year tax tables.
pub trait TaxYearRepository: Send + Sync {
    fn get_tax_year_config(
        &self,
        year: TaxYear,
    ) -> Result<TaxYearConfig, RepositoryError>;

    /// Every year with data, oldest first.
    fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError>;
}

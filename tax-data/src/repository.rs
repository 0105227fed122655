use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use tax_core::db::{DataSourceConfig, RepositoryFactory};
use tax_core::{RepositoryError, TaxYear, TaxYearConfig, TaxYearRepository};
use tracing::info;

use crate::loader::{TaxYearLoader, TaxYearLoaderError};

pub const BRACKETS_FILE: &str = "brackets.csv";
pub const THRESHOLDS_FILE: &str = "thresholds.csv";
pub const REPAYMENT_TIERS_FILE: &str = "repayment_tiers.csv";

const BUILTIN_BRACKETS: &str = include_str!("../data/brackets.csv");
const BUILTIN_THRESHOLDS: &str = include_str!("../data/thresholds.csv");
const BUILTIN_REPAYMENT_TIERS: &str = include_str!("../data/repayment_tiers.csv");

/// Validated tax year tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaxYearRepository {
    configs: BTreeMap<TaxYear, TaxYearConfig>,
}

impl InMemoryTaxYearRepository {
    /// Later entries replace earlier ones for the same year.
    pub fn new(configs: impl IntoIterator<Item = TaxYearConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.tax_year, c)).collect(),
        }
    }

    /// The tables compiled into this crate.
    pub fn builtin() -> Result<Self, TaxYearLoaderError> {
        let configs = TaxYearLoader::assemble(
            TaxYearLoader::parse_brackets(BUILTIN_BRACKETS.as_bytes())?,
            TaxYearLoader::parse_thresholds(BUILTIN_THRESHOLDS.as_bytes())?,
            TaxYearLoader::parse_repayment_tiers(BUILTIN_REPAYMENT_TIERS.as_bytes())?,
        )?;
        Ok(Self::new(configs))
    }

    /// Loads `brackets.csv`, `thresholds.csv` and `repayment_tiers.csv` from
    /// `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, TaxYearLoaderError> {
        let brackets = TaxYearLoader::parse_brackets(open(dir, BRACKETS_FILE)?)?;
        let thresholds = TaxYearLoader::parse_thresholds(open(dir, THRESHOLDS_FILE)?)?;
        let tiers = TaxYearLoader::parse_repayment_tiers(open(dir, REPAYMENT_TIERS_FILE)?)?;

        let configs = TaxYearLoader::assemble(brackets, thresholds, tiers)?;
        info!(dir = %dir.display(), years = configs.len(), "loaded tax tables");
        Ok(Self::new(configs))
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

fn open(
    dir: &Path,
    name: &str,
) -> Result<File, TaxYearLoaderError> {
    let path = dir.join(name);
    File::open(&path).map_err(|e| TaxYearLoaderError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

impl TaxYearRepository for InMemoryTaxYearRepository {
    fn get_tax_year_config(
        &self,
        year: TaxYear,
    ) -> Result<TaxYearConfig, RepositoryError> {
        self.configs
            .get(&year)
            .cloned()
            .ok_or(RepositoryError::NotFound(year))
    }

    fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError> {
        Ok(self.configs.keys().copied().collect())
    }
}

/// Serves the tables compiled into the crate. Registered as `builtin`.
pub struct BuiltinFactory;

impl RepositoryFactory for BuiltinFactory {
    fn backend_name(&self) -> &'static str {
        "builtin"
    }

    fn create(
        &self,
        _config: &DataSourceConfig,
    ) -> Result<Box<dyn TaxYearRepository>, RepositoryError> {
        let repository = InMemoryTaxYearRepository::builtin()
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        Ok(Box::new(repository))
    }
}

/// Reads the three CSV tables from the directory named by `location`.
/// Registered as `csv`.
pub struct CsvDirectoryFactory;

impl RepositoryFactory for CsvDirectoryFactory {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    fn create(
        &self,
        config: &DataSourceConfig,
    ) -> Result<Box<dyn TaxYearRepository>, RepositoryError> {
        if config.location.trim().is_empty() {
            return Err(RepositoryError::Configuration(
                "the csv backend needs a directory location".to_string(),
            ));
        }

        let repository = InMemoryTaxYearRepository::from_dir(Path::new(&config.location))
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        Ok(Box::new(repository))
    }
}

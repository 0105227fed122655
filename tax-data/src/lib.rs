pub mod loader;
pub mod repository;

pub use loader::{
    BracketRecord, RepaymentTierRecord, TaxYearLoader, TaxYearLoaderError, ThresholdRecord,
};
pub use repository::{BuiltinFactory, CsvDirectoryFactory, InMemoryTaxYearRepository};

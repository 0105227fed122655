pub mod factory;
pub mod repository;

pub use factory::{DataSourceConfig, RepositoryFactory, RepositoryRegistry};
pub use repository::{RepositoryError, TaxYearRepository};

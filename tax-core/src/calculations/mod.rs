//! Tax, levy, loan and portfolio calculations.
//!
//! Each calculator borrows its configuration and is a pure function of its
//! inputs. [`FinancialSnapshotEngine`] wires them together.

pub mod common;
pub mod income_tax;
pub mod levies;
pub mod loan;
pub mod property;
pub mod snapshot;

pub use income_tax::{IncomeTaxError, IncomeTaxSchedule};
pub use levies::{LevyCalculator, LevyInput, LevyResult};
pub use loan::{BreakEvenOffset, LoanAmortization, LoanCalculator, break_even_offset};
pub use property::{
    ExpenseBreakdown, ExpenseDefaults, Gearing, LandTaxSchedule, LandTaxTier,
    PortfolioAggregate, PropertyCalculator, PropertySummary,
};
pub use snapshot::{
    EngineSettings, FinancialReport, FinancialSnapshotEngine, OverallFinancialSnapshot,
    SnapshotError, recompute,
};

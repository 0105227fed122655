//! Progressive income tax from a bracket schedule.
//!
//! Each bracket carries the tax owed on all income below it (`base_tax`), so
//! the tax for an income is a single lookup:
//!
//! ```text
//! tax = base_tax + (income - min_income) × tax_rate
//! ```
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxBracket;
//! use tax_core::calculations::IncomeTaxSchedule;
//!
//! let brackets = vec![
//!     TaxBracket {
//!         min_income: dec!(0),
//!         max_income: Some(dec!(18200)),
//!         tax_rate: dec!(0),
//!         base_tax: dec!(0),
//!     },
//!     TaxBracket {
//!         min_income: dec!(18201),
//!         max_income: Some(dec!(45000)),
//!         tax_rate: dec!(0.16),
//!         base_tax: dec!(0),
//!     },
//!     TaxBracket {
//!         min_income: dec!(45001),
//!         max_income: None,
//!         tax_rate: dec!(0.30),
//!         base_tax: dec!(4288),
//!     },
//! ];
//!
//! let schedule = IncomeTaxSchedule::new(&brackets);
//!
//! assert_eq!(schedule.calculate(dec!(100000)).unwrap(), dec!(20787.70));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::TaxBracket;
use crate::calculations::common::{max, round_half_up};

/// Errors that can occur while evaluating a bracket schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncomeTaxError {
    /// No tax brackets were provided for the calculation.
    #[error("no tax brackets provided")]
    NoTaxBrackets,
}

/// Evaluates gross income tax against a sorted bracket schedule.
#[derive(Debug, Clone)]
pub struct IncomeTaxSchedule<'a> {
    tax_brackets: &'a [TaxBracket],
}

impl<'a> IncomeTaxSchedule<'a> {
    /// Creates a schedule over `tax_brackets`.
    ///
    /// Brackets should be sorted by `min_income` in ascending order and the
    /// last one should have `max_income` as `None`.
    pub fn new(tax_brackets: &'a [TaxBracket]) -> Self {
        Self { tax_brackets }
    }

    /// Gross tax on `taxable_income`, rounded to cents.
    ///
    /// Negative income is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns [`IncomeTaxError::NoTaxBrackets`] if the schedule is empty.
    pub fn calculate(
        &self,
        taxable_income: Decimal,
    ) -> Result<Decimal, IncomeTaxError> {
        let income = max(taxable_income, Decimal::ZERO);
        let bracket = self.active_bracket(income)?;
        let tax = bracket.tax_at(income);

        Ok(max(round_half_up(tax), Decimal::ZERO))
    }

    /// The bracket that applies to `income`.
    ///
    /// This is the last bracket whose `min_income` does not exceed `income`,
    /// which also covers fractional incomes that fall between one bracket's
    /// `max_income` and the next bracket's `min_income`.
    pub fn active_bracket(
        &self,
        income: Decimal,
    ) -> Result<&'a TaxBracket, IncomeTaxError> {
        let first = self
            .tax_brackets
            .first()
            .ok_or(IncomeTaxError::NoTaxBrackets)?;

        let bracket = self
            .tax_brackets
            .iter()
            .rev()
            .find(|b| income >= b.min_income)
            .unwrap_or(first);

        if let Some(max_income) = bracket.max_income {
            if income > max_income && std::ptr::eq(bracket, self.last_bracket()) {
                warn!(
                    income = %income,
                    max_income = %max_income,
                    "income exceeds the final bracket; schedule is not open-ended"
                );
            }
        }

        Ok(bracket)
    }

    /// Marginal rate for `income`, or zero when the schedule is empty.
    pub fn marginal_rate(
        &self,
        income: Decimal,
    ) -> Decimal {
        self.active_bracket(income)
            .map(|b| b.tax_rate)
            .unwrap_or(Decimal::ZERO)
    }

    fn last_bracket(&self) -> &'a TaxBracket {
        // Only called once a bracket has been found, so the slice is non-empty.
        &self.tax_brackets[self.tax_brackets.len() - 1]
    }
}

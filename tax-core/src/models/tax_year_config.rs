use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RepaymentTier, TaxBracket, TaxYear};

/// Largest gap tolerated between a bracket's `base_tax` and the tax computed
/// at the previous bracket's `max_income`.
///
/// Brackets meet on whole-currency boundaries (`max = next min - 1`), so the
/// schedule can legitimately drift by up to one unit times the marginal rate.
pub const CONTINUITY_TOLERANCE: Decimal = Decimal::ONE;

/// Defects in a [`TaxYearConfig`] table.
///
/// These are producer errors in the shipped data and are reported, never
/// repaired.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tax year {0} has no tax brackets")]
    NoTaxBrackets(TaxYear),

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotZero(Decimal),

    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedBracketNotLast { index: usize },

    #[error("last bracket must be unbounded, got max {0}")]
    LastBracketBounded(Decimal),

    #[error("bracket {index} should start at {expected}, got {actual}")]
    BracketGap {
        index: usize,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("bracket {index} base tax {actual} does not match {expected} carried from the previous bracket")]
    BracketDiscontinuity {
        index: usize,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("repayment tier {index} minimum is not above the previous tier")]
    RepaymentTiersNotAscending { index: usize },

    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },
}

/// Medicare levy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicareLevyConfig {
    /// Flat levy rate on taxable income (e.g. 2%).
    pub levy_rate: Decimal,
    /// Rate applied to income above the single threshold inside the
    /// shading-in band (e.g. 10%).
    pub shade_in_rate: Decimal,
    pub single_threshold: Decimal,
    /// Combined-income threshold for couples before dependents.
    pub family_threshold: Decimal,
    /// Added to the family threshold for each dependent.
    pub dependent_increment: Decimal,
}

/// Ascending income thresholds for the three surcharge tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeThresholds {
    pub base: Decimal,
    pub tier1: Decimal,
    pub tier2: Decimal,
}

/// Surcharge rate charged once income exceeds the matching threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeRates {
    pub base: Decimal,
    pub tier1: Decimal,
    pub tier2: Decimal,
}

/// Medicare Levy Surcharge parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeConfig {
    pub single: SurchargeThresholds,
    pub family: SurchargeThresholds,
    pub rates: SurchargeRates,
}

/// Low income tax offset parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowIncomeOffsetConfig {
    pub max_offset: Decimal,
    pub phase_out_start: Decimal,
    pub phase_out_rate: Decimal,
}

/// Every rate and threshold the engine needs for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: TaxYear,
    /// Sorted by `min_income`, contiguous, last bracket unbounded.
    pub brackets: Vec<TaxBracket>,
    pub medicare: MedicareLevyConfig,
    pub surcharge: SurchargeConfig,
    pub super_guarantee_rate: Decimal,
    pub low_income_offset: LowIncomeOffsetConfig,
    /// Sorted by strictly increasing `min_income`.
    pub repayment_tiers: Vec<RepaymentTier>,
}

impl TaxYearConfig {
    /// Checks the table invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: missing or non-contiguous
    /// brackets, a `base_tax` that does not carry on from the previous
    /// bracket (beyond [`CONTINUITY_TOLERANCE`]), unsorted repayment tiers,
    /// or a rate outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_brackets()?;
        self.validate_repayment_tiers()?;
        self.validate_rates()
    }

    fn validate_brackets(&self) -> Result<(), ConfigError> {
        let (first, last) = match (self.brackets.first(), self.brackets.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ConfigError::NoTaxBrackets(self.tax_year)),
        };

        if !first.min_income.is_zero() {
            return Err(ConfigError::FirstBracketNotZero(first.min_income));
        }
        if let Some(max) = last.max_income {
            return Err(ConfigError::LastBracketBounded(max));
        }

        for (index, pair) in self.brackets.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            let Some(max) = current.max_income else {
                return Err(ConfigError::UnboundedBracketNotLast { index });
            };

            let expected_min = max + Decimal::ONE;
            if next.min_income != expected_min {
                return Err(ConfigError::BracketGap {
                    index: index + 1,
                    expected: expected_min,
                    actual: next.min_income,
                });
            }

            let carried = current.tax_at(max);
            if (next.base_tax - carried).abs() > CONTINUITY_TOLERANCE {
                return Err(ConfigError::BracketDiscontinuity {
                    index: index + 1,
                    expected: carried,
                    actual: next.base_tax,
                });
            }
        }

        Ok(())
    }

    fn validate_repayment_tiers(&self) -> Result<(), ConfigError> {
        for (index, pair) in self.repayment_tiers.windows(2).enumerate() {
            if pair[1].min_income <= pair[0].min_income {
                return Err(ConfigError::RepaymentTiersNotAscending { index: index + 1 });
            }
        }
        Ok(())
    }

    fn validate_rates(&self) -> Result<(), ConfigError> {
        let mut rates = vec![
            ("super_guarantee_rate", self.super_guarantee_rate),
            ("medicare.shade_in_rate", self.medicare.shade_in_rate),
            ("surcharge.rates.base", self.surcharge.rates.base),
            ("surcharge.rates.tier1", self.surcharge.rates.tier1),
            ("surcharge.rates.tier2", self.surcharge.rates.tier2),
            (
                "low_income_offset.phase_out_rate",
                self.low_income_offset.phase_out_rate,
            ),
        ];
        rates.extend(self.brackets.iter().map(|b| ("brackets.tax_rate", b.tax_rate)));
        rates.extend(self.repayment_tiers.iter().map(|t| ("repayment_tiers.rate", t.rate)));

        for (field, value) in rates {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::RateOutOfRange { field, value });
            }
        }

        // The shading-in band divides by (1 - levy_rate).
        let levy_rate = self.medicare.levy_rate;
        if levy_rate < Decimal::ZERO || levy_rate >= Decimal::ONE {
            return Err(ConfigError::RateOutOfRange {
                field: "medicare.levy_rate",
                value: levy_rate,
            });
        }

        Ok(())
    }
}

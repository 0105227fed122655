//! Offsets and levies applied on top of gross income tax.
//!
//! | Item | Rule |
//! |------|------|
//! | Low income tax offset | full offset up to the phase-out start, then reduced linearly; never more than gross tax |
//! | Medicare levy | flat rate once income passes a threshold; singles shade in, couples test combined income |
//! | Medicare levy surcharge | tiered rate when there is no private health cover |
//! | Compulsory repayment | flat rate of the highest tier reached, on the whole income |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{LevyCalculator, LevyInput};
//! # use tax_core::{
//! #     LowIncomeOffsetConfig, MedicareLevyConfig, RelationshipStatus, RepaymentTier,
//! #     SurchargeConfig, SurchargeRates, SurchargeThresholds, TaxBracket, TaxYear,
//! #     TaxYearConfig,
//! # };
//! # let config = TaxYearConfig {
//! #     tax_year: TaxYear::starting(2024),
//! #     brackets: vec![TaxBracket {
//! #         min_income: dec!(0),
//! #         max_income: None,
//! #         tax_rate: dec!(0.30),
//! #         base_tax: dec!(0),
//! #     }],
//! #     medicare: MedicareLevyConfig {
//! #         levy_rate: dec!(0.02),
//! #         shade_in_rate: dec!(0.10),
//! #         single_threshold: dec!(26000),
//! #         family_threshold: dec!(43846),
//! #         dependent_increment: dec!(4027),
//! #     },
//! #     surcharge: SurchargeConfig {
//! #         single: SurchargeThresholds { base: dec!(97000), tier1: dec!(113000), tier2: dec!(151000) },
//! #         family: SurchargeThresholds { base: dec!(194000), tier1: dec!(226000), tier2: dec!(302000) },
//! #         rates: SurchargeRates { base: dec!(0.01), tier1: dec!(0.0125), tier2: dec!(0.015) },
//! #     },
//! #     super_guarantee_rate: dec!(0.115),
//! #     low_income_offset: LowIncomeOffsetConfig {
//! #         max_offset: dec!(700),
//! #         phase_out_start: dec!(37500),
//! #         phase_out_rate: dec!(0.05),
//! #     },
//! #     repayment_tiers: vec![RepaymentTier { min_income: dec!(97480), rate: dec!(0.105) }],
//! # };
//! let calculator = LevyCalculator::new(&config);
//! let result = calculator.calculate(&LevyInput {
//!     taxable_income: dec!(100000),
//!     gross_tax: dec!(20787.70),
//!     dependents: 0,
//!     relationship: RelationshipStatus::Single,
//!     spouse_income: dec!(0),
//!     has_private_health: true,
//!     has_education_debt: true,
//! });
//!
//! assert_eq!(result.medicare_levy, dec!(2000.00));
//! assert_eq!(result.compulsory_repayment, dec!(10500));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{max, round_half_up, round_to_whole};
use crate::{RelationshipStatus, SurchargeThresholds, TaxYearConfig};

/// Everything the levy rules look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevyInput {
    /// Taxable income after the gearing adjustment, already floored at zero.
    pub taxable_income: Decimal,
    /// Output of the bracket schedule for `taxable_income`.
    pub gross_tax: Decimal,
    pub dependents: u32,
    pub relationship: RelationshipStatus,
    pub spouse_income: Decimal,
    pub has_private_health: bool,
    pub has_education_debt: bool,
}

/// Offsets and levies for one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevyResult {
    /// Offset actually applied (capped at gross tax).
    pub low_income_offset: Decimal,
    /// Gross tax less the offset, never negative.
    pub net_tax_payable: Decimal,
    pub medicare_levy: Decimal,
    pub medicare_levy_surcharge: Decimal,
    /// Whole currency units.
    pub compulsory_repayment: Decimal,
}

/// Applies the year's offset and levy rules.
#[derive(Debug, Clone)]
pub struct LevyCalculator<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> LevyCalculator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        input: &LevyInput,
    ) -> LevyResult {
        let income = max(input.taxable_income, Decimal::ZERO);

        let low_income_offset = self.low_income_offset(income, input.gross_tax);
        let net_tax_payable = self.net_tax_payable(input.gross_tax, low_income_offset);
        let medicare_levy = self.medicare_levy(input);
        let medicare_levy_surcharge = self.medicare_levy_surcharge(input);
        let compulsory_repayment = if input.has_education_debt {
            self.compulsory_repayment(income)
        } else {
            Decimal::ZERO
        };

        debug!(
            income = %income,
            offset = %low_income_offset,
            medicare = %medicare_levy,
            surcharge = %medicare_levy_surcharge,
            repayment = %compulsory_repayment,
            "levies calculated"
        );

        LevyResult {
            low_income_offset,
            net_tax_payable,
            medicare_levy,
            medicare_levy_surcharge,
            compulsory_repayment,
        }
    }

    /// Low income tax offset for `taxable_income`, capped at `gross_tax`.
    pub fn low_income_offset(
        &self,
        taxable_income: Decimal,
        gross_tax: Decimal,
    ) -> Decimal {
        let lito = &self.config.low_income_offset;

        let entitlement = if taxable_income <= lito.phase_out_start {
            lito.max_offset
        } else {
            let reduction = (taxable_income - lito.phase_out_start) * lito.phase_out_rate;
            max(lito.max_offset - reduction, Decimal::ZERO)
        };

        round_half_up(entitlement.min(max(gross_tax, Decimal::ZERO)))
    }

    fn net_tax_payable(
        &self,
        gross_tax: Decimal,
        offset: Decimal,
    ) -> Decimal {
        max(round_half_up(gross_tax - offset), Decimal::ZERO)
    }

    /// Medicare levy on the person's own taxable income.
    pub fn medicare_levy(
        &self,
        input: &LevyInput,
    ) -> Decimal {
        let income = max(input.taxable_income, Decimal::ZERO);
        let levy = match input.relationship {
            RelationshipStatus::Single => self.single_medicare_levy(income),
            RelationshipStatus::Couple => {
                self.couple_medicare_levy(income, input.spouse_income, input.dependents)
            }
        };
        max(round_half_up(levy), Decimal::ZERO)
    }

    fn single_medicare_levy(
        &self,
        income: Decimal,
    ) -> Decimal {
        let medicare = &self.config.medicare;
        let threshold = medicare.single_threshold;
        if income <= threshold {
            return Decimal::ZERO;
        }

        let full_levy = income * medicare.levy_rate;
        let shade_in_limit = threshold / (Decimal::ONE - medicare.levy_rate);
        if income < shade_in_limit {
            full_levy.min((income - threshold) * medicare.shade_in_rate)
        } else {
            full_levy
        }
    }

    fn couple_medicare_levy(
        &self,
        income: Decimal,
        spouse_income: Decimal,
        dependents: u32,
    ) -> Decimal {
        let medicare = &self.config.medicare;
        let threshold =
            medicare.family_threshold + medicare.dependent_increment * Decimal::from(dependents);
        let combined = income + max(spouse_income, Decimal::ZERO);

        if combined > threshold {
            income * medicare.levy_rate
        } else {
            Decimal::ZERO
        }
    }

    /// Medicare levy surcharge on the person's own taxable income.
    ///
    /// Zero with private health cover. Couples are tested on combined income
    /// against the family thresholds.
    pub fn medicare_levy_surcharge(
        &self,
        input: &LevyInput,
    ) -> Decimal {
        if input.has_private_health {
            return Decimal::ZERO;
        }

        let income = max(input.taxable_income, Decimal::ZERO);
        let surcharge = &self.config.surcharge;
        let (test_income, thresholds) = match input.relationship {
            RelationshipStatus::Single => (income, &surcharge.single),
            RelationshipStatus::Couple => (
                income + max(input.spouse_income, Decimal::ZERO),
                &surcharge.family,
            ),
        };

        let rate = self.surcharge_rate(test_income, thresholds);
        max(round_half_up(income * rate), Decimal::ZERO)
    }

    fn surcharge_rate(
        &self,
        test_income: Decimal,
        thresholds: &SurchargeThresholds,
    ) -> Decimal {
        let rates = &self.config.surcharge.rates;
        if test_income > thresholds.tier2 {
            rates.tier2
        } else if test_income > thresholds.tier1 {
            rates.tier1
        } else if test_income > thresholds.base {
            rates.base
        } else {
            Decimal::ZERO
        }
    }

    /// Education-debt repayment for `repayment_income`.
    ///
    /// The rate of the highest tier reached applies to the whole income, so
    /// the amount jumps at every tier boundary.
    pub fn compulsory_repayment(
        &self,
        repayment_income: Decimal,
    ) -> Decimal {
        let rate = self
            .config
            .repayment_tiers
            .iter()
            .take_while(|tier| tier.min_income <= repayment_income)
            .last()
            .map(|tier| tier.rate)
            .unwrap_or(Decimal::ZERO);

        max(round_to_whole(repayment_income * rate), Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        LowIncomeOffsetConfig, MedicareLevyConfig, RepaymentTier, SurchargeConfig,
        SurchargeRates, TaxBracket, TaxYear,
    };

    fn test_config() -> TaxYearConfig {
        TaxYearConfig {
            tax_year: TaxYear::starting(2024),
            brackets: vec![TaxBracket {
                min_income: dec!(0),
                max_income: None,
                tax_rate: dec!(0.30),
                base_tax: dec!(0),
            }],
            medicare: MedicareLevyConfig {
                levy_rate: dec!(0.02),
                shade_in_rate: dec!(0.10),
                single_threshold: dec!(26000),
                family_threshold: dec!(43846),
                dependent_increment: dec!(4027),
            },
            surcharge: SurchargeConfig {
                single: SurchargeThresholds {
                    base: dec!(97000),
                    tier1: dec!(113000),
                    tier2: dec!(151000),
                },
                family: SurchargeThresholds {
                    base: dec!(194000),
                    tier1: dec!(226000),
                    tier2: dec!(302000),
                },
                rates: SurchargeRates {
                    base: dec!(0.01),
                    tier1: dec!(0.0125),
                    tier2: dec!(0.015),
                },
            },
            super_guarantee_rate: dec!(0.115),
            low_income_offset: LowIncomeOffsetConfig {
                max_offset: dec!(700),
                phase_out_start: dec!(37500),
                phase_out_rate: dec!(0.05),
            },
            repayment_tiers: vec![
                RepaymentTier {
                    min_income: dec!(54435),
                    rate: dec!(0.01),
                },
                RepaymentTier {
                    min_income: dec!(74856),
                    rate: dec!(0.035),
                },
                RepaymentTier {
                    min_income: dec!(97480),
                    rate: dec!(0.105),
                },
                RepaymentTier {
                    min_income: dec!(151201),
                    rate: dec!(0.11),
                },
            ],
        }
    }

    fn single_input(income: Decimal) -> LevyInput {
        LevyInput {
            taxable_income: income,
            gross_tax: income * dec!(0.30),
            dependents: 0,
            relationship: RelationshipStatus::Single,
            spouse_income: dec!(0),
            has_private_health: true,
            has_education_debt: false,
        }
    }

    fn couple_input(
        income: Decimal,
        spouse_income: Decimal,
    ) -> LevyInput {
        LevyInput {
            relationship: RelationshipStatus::Couple,
            spouse_income,
            ..single_input(income)
        }
    }

    // =========================================================================
    // low_income_offset tests
    // =========================================================================

    #[test]
    fn low_income_offset_is_full_below_phase_out() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.low_income_offset(dec!(30000), dec!(5000)), dec!(700));
    }

    #[test]
    fn low_income_offset_phases_out_linearly() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        // 700 - (40000 - 37500) * 0.05 = 575
        assert_eq!(calculator.low_income_offset(dec!(40000), dec!(5000)), dec!(575));
    }

    #[test]
    fn low_income_offset_reaches_zero() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.low_income_offset(dec!(100000), dec!(20787.70)), dec!(0));
    }

    #[test]
    fn low_income_offset_is_capped_at_gross_tax() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.low_income_offset(dec!(20000), dec!(287.84)), dec!(287.84));
    }

    #[test]
    fn low_income_offset_never_increases_past_phase_out_start() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        let mut previous = calculator.low_income_offset(dec!(37500), dec!(100000));
        for step in 1..=100 {
            let income = dec!(37500) + Decimal::from(step * 100);
            let offset = calculator.low_income_offset(income, dec!(100000));
            assert!(offset <= previous, "offset rose at {income}");
            previous = offset;
        }
        assert_eq!(previous, dec!(200));
    }

    #[test]
    fn net_tax_payable_never_negative() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);
        let input = LevyInput {
            gross_tax: dec!(100),
            ..single_input(dec!(19000))
        };

        let result = calculator.calculate(&input);

        assert_eq!(result.low_income_offset, dec!(100));
        assert_eq!(result.net_tax_payable, dec!(0));
    }

    // =========================================================================
    // medicare_levy tests
    // =========================================================================

    #[test]
    fn medicare_levy_zero_at_single_threshold() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.medicare_levy(&single_input(dec!(26000))), dec!(0));
    }

    #[test]
    fn medicare_levy_shades_in_above_threshold() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        // min(26200 * 0.02 = 524, (26200 - 26000) * 0.10 = 20)
        assert_eq!(calculator.medicare_levy(&single_input(dec!(26200))), dec!(20.00));
    }

    #[test]
    fn medicare_levy_full_rate_above_shade_in_band() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.medicare_levy(&single_input(dec!(100000))), dec!(2000.00));
    }

    #[test]
    fn medicare_levy_full_rate_at_shade_in_limit() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        // 26000 / 0.98 = 26530.61..., so 26531 is past the band
        assert_eq!(calculator.medicare_levy(&single_input(dec!(26531))), dec!(530.62));
    }

    #[test]
    fn couple_medicare_levy_uses_combined_income_for_threshold() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        // 30000 + 20000 > 43846, levy on own 30000 only
        let result = calculator.medicare_levy(&couple_input(dec!(30000), dec!(20000)));

        assert_eq!(result, dec!(600.00));
    }

    #[test]
    fn couple_medicare_levy_zero_below_family_threshold() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        let result = calculator.medicare_levy(&couple_input(dec!(30000), dec!(10000)));

        assert_eq!(result, dec!(0));
    }

    #[test]
    fn couple_family_threshold_rises_per_dependent() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);
        let input = LevyInput {
            dependents: 2,
            ..couple_input(dec!(30000), dec!(20000))
        };

        // 43846 + 2 * 4027 = 51900 > 50000
        assert_eq!(calculator.medicare_levy(&input), dec!(0));
    }

    // =========================================================================
    // medicare_levy_surcharge tests
    // =========================================================================

    #[test]
    fn surcharge_zero_with_private_health() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(
            calculator.medicare_levy_surcharge(&single_input(dec!(200000))),
            dec!(0)
        );
    }

    #[test]
    fn surcharge_tiers_for_single() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);
        let uninsured = |income| LevyInput {
            has_private_health: false,
            ..single_input(income)
        };

        assert_eq!(calculator.medicare_levy_surcharge(&uninsured(dec!(97000))), dec!(0));
        assert_eq!(
            calculator.medicare_levy_surcharge(&uninsured(dec!(100000))),
            dec!(1000.00)
        );
        assert_eq!(
            calculator.medicare_levy_surcharge(&uninsured(dec!(120000))),
            dec!(1500.00)
        );
        assert_eq!(
            calculator.medicare_levy_surcharge(&uninsured(dec!(160000))),
            dec!(2400.00)
        );
    }

    #[test]
    fn couple_surcharge_applies_rate_to_own_income_only() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);
        let input = LevyInput {
            has_private_health: false,
            ..couple_input(dec!(120000), dec!(110000))
        };

        // combined 230000 > 226000 -> 1.25% of 120000
        assert_eq!(calculator.medicare_levy_surcharge(&input), dec!(1500.00));
    }

    // =========================================================================
    // compulsory_repayment tests
    // =========================================================================

    #[test]
    fn repayment_zero_below_first_tier() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.compulsory_repayment(dec!(50000)), dec!(0));
    }

    #[test]
    fn repayment_applies_highest_tier_rate_to_whole_income() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        assert_eq!(calculator.compulsory_repayment(dec!(100000)), dec!(10500));
    }

    #[test]
    fn repayment_tier_starts_at_its_minimum() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        // 54435 * 0.01 = 544.35 -> 544
        assert_eq!(calculator.compulsory_repayment(dec!(54435)), dec!(544));
        assert_eq!(calculator.compulsory_repayment(dec!(54434)), dec!(0));
    }

    #[test]
    fn repayment_jumps_at_tier_boundary() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        let below = calculator.compulsory_repayment(dec!(97479));
        let at = calculator.compulsory_repayment(dec!(97480));

        assert_eq!(below, dec!(3412));
        assert_eq!(at, dec!(10235));
    }

    #[test]
    fn repayment_skipped_without_debt() {
        let config = test_config();
        let calculator = LevyCalculator::new(&config);

        let result = calculator.calculate(&single_input(dec!(100000)));

        assert_eq!(result.compulsory_repayment, dec!(0));
    }
}

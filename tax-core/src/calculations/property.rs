//! Per-property deductible expenses and the portfolio aggregate.
//!
//! Expenses left unset on a [`Property`] are filled from [`ExpenseDefaults`]
//! when the summary is built; the stored record is never changed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{max, round_half_up};
use crate::calculations::loan::{BreakEvenOffset, LoanCalculator, break_even_offset};
use crate::{Property, PropertyId};

/// One step of a land tax schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandTaxTier {
    pub min_value: Decimal,
    /// Tax owed at `min_value`.
    pub base: Decimal,
    pub rate: Decimal,
}

/// Tiered land tax keyed on property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandTaxSchedule {
    /// Values at or below this pay nothing.
    pub exempt_threshold: Decimal,
    /// Ascending by `min_value`.
    pub tiers: Vec<LandTaxTier>,
}

impl LandTaxSchedule {
    pub fn tax_for(
        &self,
        value: Decimal,
    ) -> Decimal {
        if value <= self.exempt_threshold {
            return Decimal::ZERO;
        }

        self.tiers
            .iter()
            .take_while(|tier| tier.min_value <= value)
            .last()
            .map(|tier| {
                let above = (value - tier.min_value).saturating_mul(tier.rate);
                round_half_up(tier.base.saturating_add(above))
            })
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for LandTaxSchedule {
    fn default() -> Self {
        Self {
            exempt_threshold: Decimal::new(1_075_000, 0),
            tiers: vec![
                LandTaxTier {
                    min_value: Decimal::new(1_075_000, 0),
                    base: Decimal::new(100, 0),
                    rate: Decimal::new(16, 3),
                },
                LandTaxTier {
                    min_value: Decimal::new(6_571_000, 0),
                    base: Decimal::new(88_036, 0),
                    rate: Decimal::new(2, 2),
                },
            ],
        }
    }
}

/// Rates used for expenses the owner left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseDefaults {
    /// Share of annual rent.
    pub agent_fee_rate: Decimal,
    /// Share of property value.
    pub council_rate: Decimal,
    /// Share of property value.
    pub repairs_rate: Decimal,
    /// Share of property value.
    pub insurance_rate: Decimal,
    pub land_tax: LandTaxSchedule,
    /// Flat annual amount.
    pub body_corporate: Decimal,
}

impl Default for ExpenseDefaults {
    fn default() -> Self {
        Self {
            agent_fee_rate: Decimal::new(7, 2),
            council_rate: Decimal::new(3, 3),
            repairs_rate: Decimal::new(1, 2),
            insurance_rate: Decimal::new(2, 3),
            land_tax: LandTaxSchedule::default(),
            body_corporate: Decimal::new(1_200, 0),
        }
    }
}

/// Resolved annual deductible expenses of one property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub interest: Decimal,
    pub agent_fee: Decimal,
    pub council_rates: Decimal,
    pub land_tax: Decimal,
    pub insurance: Decimal,
    pub repairs: Decimal,
    pub body_corporate: Decimal,
    pub depreciation: Decimal,
    pub water_rates: Decimal,
    pub letting_fee: Decimal,
    pub advertising: Decimal,
    pub other: Decimal,
}

impl ExpenseBreakdown {
    /// Everything except loan interest.
    pub fn non_interest_total(&self) -> Decimal {
        [
            self.agent_fee,
            self.council_rates,
            self.land_tax,
            self.insurance,
            self.repairs,
            self.body_corporate,
            self.depreciation,
            self.water_rates,
            self.letting_fee,
            self.advertising,
            self.other,
        ]
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn total(&self) -> Decimal {
        self.interest.saturating_add(self.non_interest_total())
    }
}

/// Direction of a property's (or the portfolio's) net result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gearing {
    Negative,
    Neutral,
    Positive,
}

impl Gearing {
    pub fn from_net_result(net: Decimal) -> Self {
        if net < Decimal::ZERO {
            Self::Negative
        } else if net > Decimal::ZERO {
            Self::Positive
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

/// Annual position of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub name: String,
    pub annual_rental_income: Decimal,
    pub expenses: ExpenseBreakdown,
    pub total_deductible_expenses: Decimal,
    /// Rent less deductible expenses. Negative for a loss.
    pub net_result: Decimal,
    /// Value less loan balance; may be negative.
    pub equity: Decimal,
    pub monthly_repayment: Decimal,
    pub break_even: BreakEvenOffset,
    pub gearing: Gearing,
}

/// Totals across every property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioAggregate {
    pub summaries: Vec<PropertySummary>,
    pub total_rental_income: Decimal,
    pub total_deductions: Decimal,
    /// Signed sum of every property's net result.
    pub net_result: Decimal,
    /// Sum of non-negative equity.
    pub total_equity: Decimal,
    pub monthly_repayments: Decimal,
}

impl PortfolioAggregate {
    pub fn gearing(&self) -> Gearing {
        Gearing::from_net_result(self.net_result)
    }
}

/// Builds property summaries using a set of expense defaults.
#[derive(Debug, Clone)]
pub struct PropertyCalculator<'a> {
    defaults: &'a ExpenseDefaults,
}

impl<'a> PropertyCalculator<'a> {
    pub fn new(defaults: &'a ExpenseDefaults) -> Self {
        Self { defaults }
    }

    /// Fills unset expenses from the defaults. Explicit values, including
    /// explicit zeros, are kept.
    pub fn resolve_expenses(
        &self,
        property: &Property,
        annual_interest: Decimal,
    ) -> ExpenseBreakdown {
        let defaults = self.defaults;
        let supplied = &property.expenses;
        let rent = property.rental_income.annual();
        let value = max(property.value, Decimal::ZERO);

        let or_default =
            |field: Option<Decimal>, default: Decimal| round_half_up(field.unwrap_or(default));
        let share_of_value = |rate: Decimal| value.saturating_mul(rate);

        ExpenseBreakdown {
            interest: annual_interest,
            agent_fee: or_default(supplied.agent_fee, rent.saturating_mul(defaults.agent_fee_rate)),
            council_rates: or_default(
                supplied.council_rates,
                share_of_value(defaults.council_rate),
            ),
            land_tax: or_default(supplied.land_tax, defaults.land_tax.tax_for(value)),
            insurance: or_default(supplied.insurance, share_of_value(defaults.insurance_rate)),
            repairs: or_default(supplied.repairs, share_of_value(defaults.repairs_rate)),
            body_corporate: or_default(supplied.body_corporate, defaults.body_corporate),
            depreciation: or_default(supplied.depreciation, Decimal::ZERO),
            water_rates: or_default(supplied.water_rates, Decimal::ZERO),
            letting_fee: or_default(supplied.letting_fee, Decimal::ZERO),
            advertising: or_default(supplied.advertising, Decimal::ZERO),
            other: or_default(supplied.other, Decimal::ZERO),
        }
    }

    pub fn summarize(
        &self,
        property: &Property,
    ) -> PropertySummary {
        let loan = LoanCalculator::new(&property.loan).calculate();
        let rent = round_half_up(property.rental_income.annual());
        let expenses = self.resolve_expenses(property, loan.annual_interest);
        let total = expenses.total();
        let net_result = rent.saturating_sub(total);
        let break_even = break_even_offset(&property.loan, rent, expenses.non_interest_total());

        debug!(
            property = %property.id,
            rent = %rent,
            expenses = %total,
            net = %net_result,
            "property summarized"
        );

        PropertySummary {
            id: property.id,
            name: property.name.clone(),
            annual_rental_income: rent,
            expenses,
            total_deductible_expenses: total,
            net_result,
            equity: property.equity(),
            monthly_repayment: loan.monthly_payment,
            break_even,
            gearing: Gearing::from_net_result(net_result),
        }
    }

    /// Summarizes every property and totals the portfolio, keeping input
    /// order.
    pub fn aggregate(
        &self,
        properties: &[Property],
    ) -> PortfolioAggregate {
        let summaries: Vec<_> = properties.iter().map(|p| self.summarize(p)).collect();

        let mut aggregate = PortfolioAggregate::default();
        for summary in &summaries {
            aggregate.total_rental_income =
                aggregate.total_rental_income.saturating_add(summary.annual_rental_income);
            aggregate.total_deductions =
                aggregate.total_deductions.saturating_add(summary.total_deductible_expenses);
            aggregate.net_result = aggregate.net_result.saturating_add(summary.net_result);
            aggregate.total_equity =
                aggregate.total_equity.saturating_add(max(summary.equity, Decimal::ZERO));
            aggregate.monthly_repayments =
                aggregate.monthly_repayments.saturating_add(summary.monthly_repayment);
        }
        aggregate.summaries = summaries;
        aggregate
    }
}

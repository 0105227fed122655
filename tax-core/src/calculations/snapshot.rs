//! The overall financial snapshot.
//!
//! One call runs the whole pipeline:
//!
//! 1. Summarize every property and net the results across the portfolio.
//! 2. A net gain is assessable income; a net loss is a deduction.
//! 3. Taxable income goes through the bracket schedule and the levy rules.
//! 4. Loan repayments and living costs are set against monthly take-home pay.
//!
//! Nothing is cached between calls. The same inputs always give the same
//! report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{max, monthly, round_half_up};
use crate::calculations::income_tax::{IncomeTaxError, IncomeTaxSchedule};
use crate::calculations::levies::{LevyCalculator, LevyInput};
use crate::calculations::loan::LoanCalculator;
use crate::calculations::property::{
    ExpenseDefaults, Gearing, PortfolioAggregate, PropertyCalculator, PropertySummary,
};
use crate::db::{RepositoryError, TaxYearRepository};
use crate::{PersonalProfile, Property, ScenarioState, TaxYear, TaxYearConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("no tax data for {0}")]
    NoDataForYear(TaxYear),

    #[error(transparent)]
    IncomeTax(#[from] IncomeTaxError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SnapshotError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(year) => Self::NoDataForYear(year),
            other => Self::Repository(other),
        }
    }
}

/// Tunables that are not part of a tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Share of gross plus other income assumed spent on living costs.
    pub living_expense_rate: Decimal,
    pub expense_defaults: ExpenseDefaults,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            living_expense_rate: Decimal::new(25, 2),
            expense_defaults: ExpenseDefaults::default(),
        }
    }
}

/// Consolidated annual and monthly position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallFinancialSnapshot {
    pub tax_year: TaxYear,
    pub total_assessable_income: Decimal,
    pub total_deductions: Decimal,
    pub taxable_income: Decimal,
    pub gross_tax: Decimal,
    /// Rate of the bracket that taxable income falls in.
    pub marginal_rate: Decimal,
    pub low_income_offset: Decimal,
    pub net_tax_payable: Decimal,
    pub medicare_levy: Decimal,
    pub medicare_levy_surcharge: Decimal,
    pub compulsory_repayment: Decimal,
    pub super_guarantee: Decimal,
    pub monthly_take_home: Decimal,
    pub monthly_loan_repayments: Decimal,
    pub monthly_living_expenses: Decimal,
    pub monthly_outgoings: Decimal,
    /// Negative for a monthly deficit.
    pub monthly_surplus: Decimal,
    pub total_equity: Decimal,
    pub portfolio_net_result: Decimal,
    pub portfolio_gearing: Gearing,
}

/// Everything one recompute produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub snapshot: OverallFinancialSnapshot,
    pub properties: Vec<PropertySummary>,
}

/// Assessable income and deductions before they are netted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IncomePosition {
    assessable: Decimal,
    deductions: Decimal,
}

impl IncomePosition {
    fn new(
        profile: &PersonalProfile,
        portfolio_net: Decimal,
    ) -> Self {
        let personal = profile.gross_income.saturating_add(profile.other_income);
        let deductions = profile.work_deductions.saturating_add(profile.salary_sacrifice);

        if portfolio_net > Decimal::ZERO {
            Self {
                assessable: personal.saturating_add(portfolio_net),
                deductions,
            }
        } else {
            Self {
                assessable: personal,
                deductions: deductions.saturating_sub(portfolio_net),
            }
        }
    }

    fn taxable(&self) -> Decimal {
        max(round_half_up(self.assessable.saturating_sub(self.deductions)), Decimal::ZERO)
    }
}

/// Combines a year's tax tables with the household's profile and portfolio.
#[derive(Debug, Clone)]
pub struct FinancialSnapshotEngine<'a> {
    config: &'a TaxYearConfig,
    settings: &'a EngineSettings,
}

impl<'a> FinancialSnapshotEngine<'a> {
    pub fn new(
        config: &'a TaxYearConfig,
        settings: &'a EngineSettings,
    ) -> Self {
        Self { config, settings }
    }

    /// Runs the full pipeline for `profile` and `properties`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::IncomeTax`] if the year has no brackets.
    pub fn calculate(
        &self,
        profile: &PersonalProfile,
        properties: &[Property],
    ) -> Result<FinancialReport, SnapshotError> {
        if profile.selected_year != self.config.tax_year {
            warn!(
                selected = %profile.selected_year,
                config = %self.config.tax_year,
                "profile year differs from the tables in use"
            );
        }

        let portfolio =
            PropertyCalculator::new(&self.settings.expense_defaults).aggregate(properties);
        let position = IncomePosition::new(profile, portfolio.net_result);
        let taxable_income = position.taxable();

        let schedule = IncomeTaxSchedule::new(&self.config.brackets);
        let gross_tax = schedule.calculate(taxable_income)?;
        let levies = LevyCalculator::new(self.config).calculate(&LevyInput {
            taxable_income,
            gross_tax,
            dependents: profile.dependents,
            relationship: profile.relationship,
            spouse_income: profile.household_spouse_income(),
            has_private_health: profile.has_private_health,
            has_education_debt: profile.has_education_debt,
        });

        let super_guarantee = round_half_up(profile.gross_income * self.config.super_guarantee_rate);
        let monthly_take_home = round_half_up(monthly(taxable_income - levies.net_tax_payable));

        let monthly_loan_repayments = portfolio.monthly_repayments + self.residence_repayment(profile);
        let monthly_living_expenses = self.living_expenses(profile);
        let monthly_outgoings = monthly_loan_repayments + monthly_living_expenses;

        debug!(
            year = %self.config.tax_year,
            taxable = %taxable_income,
            gross_tax = %gross_tax,
            portfolio = %portfolio.net_result,
            "snapshot calculated"
        );

        let snapshot = OverallFinancialSnapshot {
            tax_year: self.config.tax_year,
            total_assessable_income: round_half_up(position.assessable),
            total_deductions: round_half_up(position.deductions),
            taxable_income,
            gross_tax,
            marginal_rate: schedule.marginal_rate(taxable_income),
            low_income_offset: levies.low_income_offset,
            net_tax_payable: levies.net_tax_payable,
            medicare_levy: levies.medicare_levy,
            medicare_levy_surcharge: levies.medicare_levy_surcharge,
            compulsory_repayment: levies.compulsory_repayment,
            super_guarantee,
            monthly_take_home,
            monthly_loan_repayments,
            monthly_living_expenses,
            monthly_outgoings,
            monthly_surplus: monthly_take_home - monthly_outgoings,
            total_equity: self.total_equity(profile, &portfolio),
            portfolio_net_result: portfolio.net_result,
            portfolio_gearing: portfolio.gearing(),
        };

        Ok(FinancialReport {
            snapshot,
            properties: portfolio.summaries,
        })
    }

    fn residence_repayment(
        &self,
        profile: &PersonalProfile,
    ) -> Decimal {
        profile
            .primary_residence
            .as_ref()
            .map(|home| LoanCalculator::new(&home.loan).calculate().monthly_payment)
            .unwrap_or(Decimal::ZERO)
    }

    fn living_expenses(
        &self,
        profile: &PersonalProfile,
    ) -> Decimal {
        let income = max(profile.gross_income + profile.other_income, Decimal::ZERO);
        let running_costs = profile
            .primary_residence
            .as_ref()
            .map(|home| home.monthly_running_costs)
            .unwrap_or(Decimal::ZERO);

        round_half_up(monthly(income * self.settings.living_expense_rate) + running_costs)
    }

    fn total_equity(
        &self,
        profile: &PersonalProfile,
        portfolio: &PortfolioAggregate,
    ) -> Decimal {
        let home_equity = profile
            .primary_residence
            .as_ref()
            .map(|home| max(home.value - home.loan.balance, Decimal::ZERO))
            .unwrap_or(Decimal::ZERO);

        portfolio.total_equity + home_equity
    }
}

/// Looks up the state's selected year and runs the engine on it.
///
/// # Errors
///
/// Returns [`SnapshotError::NoDataForYear`] when the repository has no tables
/// for the selected year. No partial report is produced.
pub fn recompute(
    repository: &dyn TaxYearRepository,
    state: &ScenarioState,
    settings: &EngineSettings,
) -> Result<FinancialReport, SnapshotError> {
    let config = repository.get_tax_year_config(state.selected_year())?;

    FinancialSnapshotEngine::new(&config, settings).calculate(&state.profile, &state.properties)
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LoanTerms, RelationshipStatus, TaxYear};

/// The owner-occupied home, if the household has one.
///
/// It contributes loan repayments, running costs and equity to the snapshot
/// but nothing to taxable income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryResidence {
    pub value: Decimal,
    pub loan: LoanTerms,
    pub monthly_running_costs: Decimal,
}

/// Income and circumstances of the person being assessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalProfile {
    pub selected_year: TaxYear,
    /// Salary and wages before tax.
    pub gross_income: Decimal,
    /// Interest, dividends and other assessable income.
    pub other_income: Decimal,
    /// Work-related deductions.
    pub work_deductions: Decimal,
    /// Pre-tax salary sacrificed into superannuation.
    pub salary_sacrifice: Decimal,
    pub has_private_health: bool,
    pub dependents: u32,
    pub relationship: RelationshipStatus,
    /// Spouse's taxable income. Ignored when single.
    pub spouse_income: Decimal,
    pub has_education_debt: bool,
    #[serde(default)]
    pub primary_residence: Option<PrimaryResidence>,
}

impl PersonalProfile {
    /// A single person with no income for `selected_year`.
    pub fn new(selected_year: TaxYear) -> Self {
        Self {
            selected_year,
            gross_income: Decimal::ZERO,
            other_income: Decimal::ZERO,
            work_deductions: Decimal::ZERO,
            salary_sacrifice: Decimal::ZERO,
            has_private_health: false,
            dependents: 0,
            relationship: RelationshipStatus::Single,
            spouse_income: Decimal::ZERO,
            has_education_debt: false,
            primary_residence: None,
        }
    }

    /// Spouse income counted for household tests; zero when single.
    pub fn household_spouse_income(&self) -> Decimal {
        if self.relationship.is_couple() {
            self.spouse_income
        } else {
            Decimal::ZERO
        }
    }
}

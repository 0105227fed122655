use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LoanTerms;

/// Weeks used to annualise a weekly rent.
pub const WEEKS_PER_YEAR: Decimal = Decimal::from_parts(52, 0, 0, false, 0);

/// Stable identity of a property within a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

impl fmt::Display for PropertyId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rent as the owner quoted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalIncome {
    Weekly(Decimal),
    Annual(Decimal),
}

impl RentalIncome {
    /// Yearly rent. A weekly figure too large to annualise saturates at the
    /// `Decimal` bounds.
    pub fn annual(&self) -> Decimal {
        match self {
            Self::Weekly(weekly) => weekly.saturating_mul(WEEKS_PER_YEAR),
            Self::Annual(annual) => *annual,
        }
    }
}

impl Default for RentalIncome {
    fn default() -> Self {
        Self::Weekly(Decimal::ZERO)
    }
}

/// Annual running costs of a rental property.
///
/// `None` means the owner left the field blank, so the calculator substitutes
/// its default. `Some(0)` is an explicit zero and is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyExpenses {
    /// Property manager's fee.
    pub agent_fee: Option<Decimal>,
    pub council_rates: Option<Decimal>,
    pub land_tax: Option<Decimal>,
    pub insurance: Option<Decimal>,
    /// Repairs and maintenance.
    pub repairs: Option<Decimal>,
    /// Strata / owners corporation levies.
    pub body_corporate: Option<Decimal>,
    pub depreciation: Option<Decimal>,
    pub water_rates: Option<Decimal>,
    /// Letting fee charged when a new tenant is placed.
    pub letting_fee: Option<Decimal>,
    pub advertising: Option<Decimal>,
    pub other: Option<Decimal>,
}

/// An investment property owned by the household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    /// Current market value.
    pub value: Decimal,
    pub loan: LoanTerms,
    pub rental_income: RentalIncome,
    #[serde(default)]
    pub expenses: PropertyExpenses,
}

impl Property {
    /// `value - loan balance`. May be negative for an underwater property.
    pub fn equity(&self) -> Decimal {
        self.value.saturating_sub(self.loan.balance)
    }
}

/// A property before it has been assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
    pub name: String,
    pub value: Decimal,
    pub loan: LoanTerms,
    pub rental_income: RentalIncome,
    pub expenses: PropertyExpenses,
}

impl NewProperty {
    pub fn with_id(
        self,
        id: PropertyId,
    ) -> Property {
        Property {
            id,
            name: self.name,
            value: self.value,
            loan: self.loan,
            rental_income: self.rental_income,
            expenses: self.expenses,
        }
    }
}

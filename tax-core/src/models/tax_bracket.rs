use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of a progressive rate schedule.
///
/// `base_tax` is the tax owed on income up to `min_income`; income inside
/// the bracket is taxed at `tax_rate` on the amount above `min_income`.
/// A `max_income` of `None` means the bracket is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    /// Tax for `income` assuming this bracket is the active one.
    pub fn tax_at(
        &self,
        income: Decimal,
    ) -> Decimal {
        self.base_tax + (income - self.min_income) * self.tax_rate
    }
}

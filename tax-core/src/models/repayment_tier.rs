use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An education-debt repayment threshold.
///
/// Once repayment income reaches `min_income`, `rate` applies to the whole
/// income rather than the portion above the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentTier {
    pub min_income: Decimal,
    pub rate: Decimal,
}

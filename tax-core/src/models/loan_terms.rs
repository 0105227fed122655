use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Repayment structure of a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanType {
    #[default]
    PrincipalAndInterest,
    InterestOnly,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrincipalAndInterest => "P&I",
            Self::InterestOnly => "IO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p&i" | "pi" | "principal_and_interest" | "principal-and-interest" => {
                Some(Self::PrincipalAndInterest)
            }
            "io" | "interest_only" | "interest-only" => Some(Self::InterestOnly),
            _ => None,
        }
    }
}

/// A loan secured against a property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Outstanding loan balance.
    pub balance: Decimal,
    /// Cash held in a linked offset account. Reduces the interest-bearing
    /// principal without reducing `balance`.
    pub offset_balance: Decimal,
    /// Nominal rate in percent per annum (`6.0` means 6%).
    pub annual_rate: Decimal,
    pub term_years: u32,
    pub loan_type: LoanType,
}

impl LoanTerms {
    /// `max(0, balance - offset_balance)`: the amount actually accruing interest.
    pub fn effective_principal(&self) -> Decimal {
        (self.balance - self.offset_balance).max(Decimal::ZERO)
    }
}

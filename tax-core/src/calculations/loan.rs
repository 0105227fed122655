//! Loan repayments and the break-even offset solver.
//!
//! Interest accrues on the effective principal, `max(0, balance - offset)`.
//! Figures are reported for the first month of the loan; no full schedule is
//! produced.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::{LoanTerms, LoanType};
//! use tax_core::calculations::LoanCalculator;
//!
//! let terms = LoanTerms {
//!     balance: dec!(500000),
//!     offset_balance: dec!(50000),
//!     annual_rate: dec!(6.00),
//!     term_years: 30,
//!     loan_type: LoanType::PrincipalAndInterest,
//! };
//!
//! let result = LoanCalculator::new(&terms).calculate();
//!
//! assert_eq!(result.effective_principal, dec!(450000));
//! assert_eq!(result.monthly_interest, dec!(2250.00));
//! assert_eq!(result.monthly_payment, dec!(2697.98));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::{MONTHS_PER_YEAR, max, percent_to_rate, round_half_up};
use crate::{LoanTerms, LoanType};

/// First-month repayment figures for a loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAmortization {
    pub effective_principal: Decimal,
    pub monthly_payment: Decimal,
    pub monthly_principal: Decimal,
    pub monthly_interest: Decimal,
    /// `monthly_interest × 12`.
    pub annual_interest: Decimal,
    /// Interest paid over the whole term.
    pub total_interest: Decimal,
}

/// Amortizes a single loan.
#[derive(Debug, Clone)]
pub struct LoanCalculator<'a> {
    terms: &'a LoanTerms,
}

impl<'a> LoanCalculator<'a> {
    pub fn new(terms: &'a LoanTerms) -> Self {
        Self { terms }
    }

    /// Repayment figures for the loan.
    ///
    /// Returns all zeros when there is nothing to amortize: a fully offset
    /// balance, a negative rate or a zero term.
    pub fn calculate(&self) -> LoanAmortization {
        let principal = self.terms.effective_principal();
        let months = self.terms.term_years.saturating_mul(12);

        if principal <= Decimal::ZERO || self.terms.annual_rate < Decimal::ZERO || months == 0 {
            return LoanAmortization::default();
        }

        let monthly_rate = percent_to_rate(self.terms.annual_rate) / MONTHS_PER_YEAR;
        let n = Decimal::from(months);

        let (payment, interest) = if monthly_rate.is_zero() {
            (principal / n, Decimal::ZERO)
        } else {
            let interest = round_half_up(principal * monthly_rate);
            match self.terms.loan_type {
                LoanType::InterestOnly => (interest, interest),
                LoanType::PrincipalAndInterest => {
                    (annuity_payment(principal, monthly_rate, months), interest)
                }
            }
        };

        let monthly_payment = round_half_up(payment);
        let monthly_principal = max(monthly_payment - interest, Decimal::ZERO);
        let total_interest = match self.terms.loan_type {
            _ if interest.is_zero() => Decimal::ZERO,
            LoanType::InterestOnly => interest * n,
            LoanType::PrincipalAndInterest => {
                max(monthly_payment * n - principal, Decimal::ZERO)
            }
        };

        LoanAmortization {
            effective_principal: principal,
            monthly_payment,
            monthly_principal,
            monthly_interest: interest,
            annual_interest: interest * MONTHS_PER_YEAR,
            total_interest: round_half_up(total_interest),
        }
    }
}

/// `P × r / (1 − (1 + r)^−n)`, the same annuity formula as
/// `P × r(1+r)^n / ((1+r)^n − 1)`.
fn annuity_payment(
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
) -> Decimal {
    let Some(compound) = compound_factor(monthly_rate, months) else {
        warn!(
            monthly_rate = %monthly_rate,
            months,
            "compound factor overflowed; using interest-only payment"
        );
        return principal * monthly_rate;
    };

    let denominator = Decimal::ONE - Decimal::ONE / compound;
    if denominator.is_zero() {
        return principal / Decimal::from(months);
    }

    principal * monthly_rate / denominator
}

/// `(1 + r)^n` by square-and-multiply, or `None` on overflow.
fn compound_factor(
    rate: Decimal,
    periods: u32,
) -> Option<Decimal> {
    let mut base = Decimal::ONE + rate;
    let mut remaining = periods;
    let mut compound = Decimal::ONE;
    while remaining > 0 {
        if remaining & 1 == 1 {
            compound = compound.checked_mul(base)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(compound)
}

/// Outcome of the break-even offset solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakEvenOffset {
    /// Rent already covers every expense with no offset.
    AlreadyNeutral,
    /// Offset balance that brings the net result to exactly zero.
    Required(Decimal),
    /// Non-interest expenses alone exceed the rent. A full offset only
    /// reduces the loss to `remaining_loss`.
    Unreachable {
        full_offset: Decimal,
        remaining_loss: Decimal,
    },
}

impl BreakEvenOffset {
    /// The offset balance to hold: zero, the solved amount, or the full loan.
    pub fn recommended_offset(&self) -> Decimal {
        match self {
            Self::AlreadyNeutral => Decimal::ZERO,
            Self::Required(offset) => *offset,
            Self::Unreachable { full_offset, .. } => *full_offset,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !matches!(self, Self::Unreachable { .. })
    }
}

/// Offset balance at which `annual_rent - non_interest_expenses - interest`
/// is zero.
///
/// The existing offset balance is ignored; the answer is the total offset
/// needed. It never exceeds the loan balance.
pub fn break_even_offset(
    terms: &LoanTerms,
    annual_rent: Decimal,
    non_interest_expenses: Decimal,
) -> BreakEvenOffset {
    let balance = max(terms.balance, Decimal::ZERO);
    let affordable_interest = annual_rent.saturating_sub(non_interest_expenses);

    if affordable_interest < Decimal::ZERO {
        return BreakEvenOffset::Unreachable {
            full_offset: balance,
            remaining_loss: round_half_up(-affordable_interest),
        };
    }

    let rate = percent_to_rate(terms.annual_rate);
    if rate <= Decimal::ZERO || balance.saturating_mul(rate) <= affordable_interest {
        return BreakEvenOffset::AlreadyNeutral;
    }

    let principal_needed = affordable_interest / rate;
    let offset = (balance - principal_needed).clamp(Decimal::ZERO, balance);

    BreakEvenOffset::Required(round_half_up(offset))
}

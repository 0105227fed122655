//! CSV loader for rental properties.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Every
//! column except `name` may be left out entirely. Amounts go through
//! [`crate::coerce`], so `$1,200` and `1200` are the same.
//!
//! | Column | Type | Notes |
//! |------------------|---------|-------------------------------------------------|
//! | `name` | string | required |
//! | `value` | decimal | market value |
//! | `loan_balance` | decimal | |
//! | `offset_balance` | decimal | |
//! | `interest_rate` | decimal | percent per annum, e.g. `6.19` |
//! | `term_years` | integer | |
//! | `loan_type` | string | `P&I` (default) or `IO` |
//! | `rent` | decimal | |
//! | `rent_period` | string | `weekly` (default) or `annual` |
//! | `agent_fee` .. `other` | decimal | empty cell = use the default |
//!
//! The expense columns are `agent_fee`, `council_rates`, `land_tax`,
//! `insurance`, `repairs`, `body_corporate`, `depreciation`, `water_rates`,
//! `letting_fee`, `advertising` and `other`.
//!
//! ### Minimal example
//!
//! ```csv
//! name,value,loan_balance,interest_rate,term_years,rent
//! Unit 4,550000,440000,6.19,30,520
//! ```
use serde::Deserialize;
use tax_core::{LoanTerms, LoanType, NewProperty, PropertyExpenses, RentalIncome};

use crate::coerce::{coerce_decimal, coerce_optional_decimal, coerce_u32};

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    name: String,
    value: String,
    loan_balance: String,
    offset_balance: String,
    interest_rate: String,
    term_years: String,
    loan_type: String,
    rent: String,
    rent_period: String,
    agent_fee: String,
    council_rates: String,
    land_tax: String,
    insurance: String,
    repairs: String,
    body_corporate: String,
    depreciation: String,
    water_rates: String,
    letting_fee: String,
    advertising: String,
    other: String,
}

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The underlying CSV deserialisation failed.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("failed to read CSV: {0}")]
    Io(#[from] std::io::Error),

    /// `row` is 1-based (header = row 0).
    #[error("missing property name on row {row}")]
    MissingName { row: usize },

    #[error("unrecognised loan type '{value}' on row {row}")]
    InvalidLoanType { value: String, row: usize },

    #[error("unrecognised rent period '{value}' on row {row} (expected weekly or annual)")]
    InvalidRentPeriod { value: String, row: usize },
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

fn parse_loan_type(
    value: &str,
    row: usize,
) -> Result<LoanType, CsvLoadError> {
    if value.trim().is_empty() {
        return Ok(LoanType::default());
    }
    LoanType::parse(value).ok_or_else(|| CsvLoadError::InvalidLoanType {
        value: value.to_string(),
        row,
    })
}

fn parse_rent(
    amount: &str,
    period: &str,
    row: usize,
) -> Result<RentalIncome, CsvLoadError> {
    let amount = coerce_decimal(amount);
    match period.trim().to_ascii_lowercase().as_str() {
        "" | "weekly" | "week" | "w" => Ok(RentalIncome::Weekly(amount)),
        "annual" | "annually" | "yearly" | "year" | "a" | "y" => Ok(RentalIncome::Annual(amount)),
        _ => Err(CsvLoadError::InvalidRentPeriod {
            value: period.to_string(),
            row,
        }),
    }
}

/// Convert a single CSV row into a [`NewProperty`].
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<NewProperty, CsvLoadError> {
    if row.name.trim().is_empty() {
        return Err(CsvLoadError::MissingName { row: row_number });
    }

    Ok(NewProperty {
        loan: LoanTerms {
            balance: coerce_decimal(&row.loan_balance),
            offset_balance: coerce_decimal(&row.offset_balance),
            annual_rate: coerce_decimal(&row.interest_rate),
            term_years: coerce_u32(&row.term_years),
            loan_type: parse_loan_type(&row.loan_type, row_number)?,
        },
        rental_income: parse_rent(&row.rent, &row.rent_period, row_number)?,
        expenses: PropertyExpenses {
            agent_fee: coerce_optional_decimal(&row.agent_fee),
            council_rates: coerce_optional_decimal(&row.council_rates),
            land_tax: coerce_optional_decimal(&row.land_tax),
            insurance: coerce_optional_decimal(&row.insurance),
            repairs: coerce_optional_decimal(&row.repairs),
            body_corporate: coerce_optional_decimal(&row.body_corporate),
            depreciation: coerce_optional_decimal(&row.depreciation),
            water_rates: coerce_optional_decimal(&row.water_rates),
            letting_fee: coerce_optional_decimal(&row.letting_fee),
            advertising: coerce_optional_decimal(&row.advertising),
            other: coerce_optional_decimal(&row.other),
        },
        value: coerce_decimal(&row.value),
        name: row.name.trim().to_string(),
    })
}

/// Parse CSV text and return the properties in file order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid.
/// * [`CsvLoadError::MissingName`], [`CsvLoadError::InvalidLoanType`] or
///   [`CsvLoadError::InvalidRentPeriod`] for a bad row.
pub fn load_from_str(input: &str) -> Result<Vec<NewProperty>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All) // tolerate whitespace around values
        .flexible(false) // strict column count
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            let row_number = idx + 1; // 1-based for user-facing messages
            convert_row(row, row_number)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &std::path::Path) -> Result<Vec<NewProperty>, CsvLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

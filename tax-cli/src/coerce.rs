//! Turning user-typed amounts into [`Decimal`]s.
//!
//! Everything the engine sees has been through here first: currency
//! symbols, whitespace and thousands separators are stripped, and blank
//! input becomes zero (or "unset" for defaultable fields).

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,$€£¥]").expect("hardcoded regex should be valid"));

/// Trims and removes currency symbols, whitespace and commas.
fn normalize_decimal_input(s: &str) -> String {
    NOISE.replace_all(s, "").into_owned()
}

/// Parses a string into a [`Decimal`].
///
/// Accepts `"$1,234.56"`, `" 1 234.56 "` and plain `"1234.56"`. Empty or
/// whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| ParseDecimalError {
        input: s.to_string(),
        source: e,
    })
}

/// Like [`parse_decimal`] but maps invalid input to zero, logging a warning.
pub fn coerce_decimal(s: &str) -> Decimal {
    parse_decimal(s).unwrap_or_else(|e| {
        tracing::warn!(input = %s, "treating invalid amount as 0: {}", e);
        Decimal::ZERO
    })
}

/// Parses a defaultable field.
///
/// Returns `None` for empty input so the calculator's default applies, and
/// also for invalid input (with a warning).
pub fn coerce_optional_decimal(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        None
    } else {
        normalized.parse().map_or_else(
            |e| {
                tracing::warn!(input = %s, "ignoring invalid optional amount: {}", e);
                None
            },
            Some,
        )
    }
}

/// Parses a whole number such as a loan term, treating blanks and garbage
/// as 0.
pub fn coerce_u32(s: &str) -> u32 {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return 0;
    }
    normalized.parse().unwrap_or_else(|e| {
        tracing::warn!(input = %s, "treating invalid count as 0: {}", e);
        0
    })
}

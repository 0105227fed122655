use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a recognisable tax year key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid tax year '{0}' (expected e.g. \"2024-25\")")]
pub struct ParseTaxYearError(pub String);

/// A financial year key such as `2024-25`.
///
/// The year runs from `start_year` into the following calendar year. It is
/// displayed and serialized in the short `YYYY-YY` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxYear {
    start_year: i32,
}

impl TaxYear {
    /// Creates the tax year beginning in `start_year`.
    pub const fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// Parses `"2024-25"` or `"2024-2025"`.
    ///
    /// The second half must name the year immediately following the first.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.trim().split_once('-')?;
        let start_year: i32 = start.parse().ok()?;
        if start.len() != 4 {
            return None;
        }
        let expected_end = start_year + 1;
        let end_matches = match end.len() {
            2 => end.parse::<i32>().ok()? == expected_end.rem_euclid(100),
            4 => end.parse::<i32>().ok()? == expected_end,
            _ => false,
        };
        end_matches.then_some(Self { start_year })
    }
}

impl fmt::Display for TaxYear {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, self.end_year().rem_euclid(100))
    }
}

impl FromStr for TaxYear {
    type Err = ParseTaxYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseTaxYearError(s.to_string()))
    }
}

impl TryFrom<String> for TaxYear {
    type Error = ParseTaxYearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaxYear> for String {
    fn from(year: TaxYear) -> Self {
        year.to_string()
    }
}

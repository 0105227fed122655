use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    ConfigError, LowIncomeOffsetConfig, MedicareLevyConfig, RepaymentTier, SurchargeConfig,
    SurchargeRates, SurchargeThresholds, TaxBracket, TaxYear, TaxYearConfig,
};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading tax year tables.
#[derive(Debug, Error)]
pub enum TaxYearLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Tax year {0} has rows but no thresholds record")]
    MissingThresholds(TaxYear),

    #[error("Tax year {0} has more than one thresholds record")]
    DuplicateThresholds(TaxYear),

    #[error("Tax year {year} is invalid: {source}")]
    InvalidConfig {
        year: TaxYear,
        #[source]
        source: ConfigError,
    },
}

impl From<csv::Error> for TaxYearLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxYearLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from `brackets.csv`.
///
/// - `tax_year`: the year key (e.g. `2024-25`)
/// - `min_income`: the first whole dollar of the bracket
/// - `max_income`: the last whole dollar (empty for unlimited)
/// - `base_tax`: tax owed on all income below `min_income`
/// - `rate`: the marginal rate as a decimal (e.g. 0.30 for 30%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: TaxYear,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

/// One row of `thresholds.csv`: every scalar constant of a year.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThresholdRecord {
    pub tax_year: TaxYear,
    pub medicare_levy_rate: Decimal,
    pub medicare_shade_in_rate: Decimal,
    pub medicare_single_threshold: Decimal,
    pub medicare_family_threshold: Decimal,
    pub medicare_dependent_increment: Decimal,
    pub mls_single_base: Decimal,
    pub mls_single_tier1: Decimal,
    pub mls_single_tier2: Decimal,
    pub mls_family_base: Decimal,
    pub mls_family_tier1: Decimal,
    pub mls_family_tier2: Decimal,
    pub mls_rate_base: Decimal,
    pub mls_rate_tier1: Decimal,
    pub mls_rate_tier2: Decimal,
    pub super_guarantee_rate: Decimal,
    pub lito_max: Decimal,
    pub lito_phase_out_start: Decimal,
    pub lito_phase_out_rate: Decimal,
}

/// A single record from `repayment_tiers.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RepaymentTierRecord {
    pub tax_year: TaxYear,
    pub min_income: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<R, T>(reader: R) -> Result<Vec<T>, TaxYearLoaderError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

impl ThresholdRecord {
    fn into_config(
        self,
        brackets: Vec<TaxBracket>,
        repayment_tiers: Vec<RepaymentTier>,
    ) -> TaxYearConfig {
        TaxYearConfig {
            tax_year: self.tax_year,
            brackets,
            medicare: MedicareLevyConfig {
                levy_rate: self.medicare_levy_rate,
                shade_in_rate: self.medicare_shade_in_rate,
                single_threshold: self.medicare_single_threshold,
                family_threshold: self.medicare_family_threshold,
                dependent_increment: self.medicare_dependent_increment,
            },
            surcharge: SurchargeConfig {
                single: SurchargeThresholds {
                    base: self.mls_single_base,
                    tier1: self.mls_single_tier1,
                    tier2: self.mls_single_tier2,
                },
                family: SurchargeThresholds {
                    base: self.mls_family_base,
                    tier1: self.mls_family_tier1,
                    tier2: self.mls_family_tier2,
                },
                rates: SurchargeRates {
                    base: self.mls_rate_base,
                    tier1: self.mls_rate_tier1,
                    tier2: self.mls_rate_tier2,
                },
            },
            super_guarantee_rate: self.super_guarantee_rate,
            low_income_offset: LowIncomeOffsetConfig {
                max_offset: self.lito_max,
                phase_out_start: self.lito_phase_out_start,
                phase_out_rate: self.lito_phase_out_rate,
            },
            repayment_tiers,
        }
    }
}

/// Builds [`TaxYearConfig`]s from the three CSV tables.
///
/// Rows may appear in any order; brackets and tiers are sorted by
/// `min_income` before the assembled year is validated.
pub struct TaxYearLoader;

impl TaxYearLoader {
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, TaxYearLoaderError> {
        parse_records(reader)
    }

    pub fn parse_thresholds<R: Read>(
        reader: R
    ) -> Result<Vec<ThresholdRecord>, TaxYearLoaderError> {
        parse_records(reader)
    }

    pub fn parse_repayment_tiers<R: Read>(
        reader: R
    ) -> Result<Vec<RepaymentTierRecord>, TaxYearLoaderError> {
        parse_records(reader)
    }

    /// Groups records by year and validates each assembled year.
    ///
    /// Every year needs exactly one thresholds record. Bracket or tier rows
    /// for a year without one are an error.
    pub fn assemble(
        brackets: Vec<BracketRecord>,
        thresholds: Vec<ThresholdRecord>,
        repayment_tiers: Vec<RepaymentTierRecord>,
    ) -> Result<Vec<TaxYearConfig>, TaxYearLoaderError> {
        let mut by_year: BTreeMap<TaxYear, ThresholdRecord> = BTreeMap::new();
        for record in thresholds {
            let year = record.tax_year;
            if by_year.insert(year, record).is_some() {
                return Err(TaxYearLoaderError::DuplicateThresholds(year));
            }
        }

        let mut bracket_groups: BTreeMap<TaxYear, Vec<TaxBracket>> = BTreeMap::new();
        for record in brackets {
            if !by_year.contains_key(&record.tax_year) {
                return Err(TaxYearLoaderError::MissingThresholds(record.tax_year));
            }
            bracket_groups
                .entry(record.tax_year)
                .or_default()
                .push(TaxBracket {
                    min_income: record.min_income,
                    max_income: record.max_income,
                    tax_rate: record.rate,
                    base_tax: record.base_tax,
                });
        }

        let mut tier_groups: BTreeMap<TaxYear, Vec<RepaymentTier>> = BTreeMap::new();
        for record in repayment_tiers {
            if !by_year.contains_key(&record.tax_year) {
                return Err(TaxYearLoaderError::MissingThresholds(record.tax_year));
            }
            tier_groups
                .entry(record.tax_year)
                .or_default()
                .push(RepaymentTier {
                    min_income: record.min_income,
                    rate: record.rate,
                });
        }

        let mut configs = Vec::with_capacity(by_year.len());
        for (year, record) in by_year {
            let mut year_brackets = bracket_groups.remove(&year).unwrap_or_default();
            year_brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            let mut year_tiers = tier_groups.remove(&year).unwrap_or_default();
            year_tiers.sort_by(|a, b| a.min_income.cmp(&b.min_income));

            let config = record.into_config(year_brackets, year_tiers);
            config
                .validate()
                .map_err(|source| TaxYearLoaderError::InvalidConfig { year, source })?;

            debug!(
                year = %year,
                brackets = config.brackets.len(),
                tiers = config.repayment_tiers.len(),
                "tax year assembled"
            );
            configs.push(config);
        }

        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const BRACKETS_CSV: &str = "tax_year,min_income,max_income,base_tax,rate
2024-25,45001,,4288,0.30
2024-25,0,18200,0,0
2024-25,18201,45000,0,0.16
";

    const THRESHOLDS_CSV: &str = "tax_year,medicare_levy_rate,medicare_shade_in_rate,medicare_single_threshold,medicare_family_threshold,medicare_dependent_increment,mls_single_base,mls_single_tier1,mls_single_tier2,mls_family_base,mls_family_tier1,mls_family_tier2,mls_rate_base,mls_rate_tier1,mls_rate_tier2,super_guarantee_rate,lito_max,lito_phase_out_start,lito_phase_out_rate
2024-25,0.02,0.10,26000,43846,4027,97000,113000,151000,194000,226000,302000,0.01,0.0125,0.015,0.115,700,37500,0.05
";

    const TIERS_CSV: &str = "tax_year,min_income,rate
2024-25,97480,0.105
2024-25,54435,0.01
";

    fn parse_all(
        brackets: &str,
        thresholds: &str,
        tiers: &str,
    ) -> Result<Vec<TaxYearConfig>, TaxYearLoaderError> {
        TaxYearLoader::assemble(
            TaxYearLoader::parse_brackets(brackets.as_bytes())?,
            TaxYearLoader::parse_thresholds(thresholds.as_bytes())?,
            TaxYearLoader::parse_repayment_tiers(tiers.as_bytes())?,
        )
    }

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_single_bracket() {
        let csv = "tax_year,min_income,max_income,base_tax,rate\n2024-25,18201,45000,0,0.16";

        let records = TaxYearLoader::parse_brackets(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![BracketRecord {
                tax_year: TaxYear::starting(2024),
                min_income: dec!(18201),
                max_income: Some(dec!(45000)),
                base_tax: dec!(0),
                rate: dec!(0.16),
            }]
        );
    }

    #[test]
    fn test_parse_unlimited_max_income() {
        let csv = "tax_year,min_income,max_income,base_tax,rate\n2024-25,190001,,51638,0.45";

        let records = TaxYearLoader::parse_brackets(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].max_income, None);
        assert_eq!(records[0].base_tax, dec!(51638));
    }

    #[test]
    fn test_parse_accepts_long_year_form() {
        let csv = "tax_year,min_income,rate\n2024-2025,54435,0.01";

        let records =
            TaxYearLoader::parse_repayment_tiers(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].tax_year, TaxYear::starting(2024));
    }

    #[test]
    fn test_parse_rejects_bad_year() {
        let csv = "tax_year,min_income,rate\nFY25,54435,0.01";

        let err = TaxYearLoader::parse_repayment_tiers(csv.as_bytes())
            .expect_err("Should fail for invalid year");

        let TaxYearLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("FY25"), "got: {msg}");
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "tax_year,min_income\n2024-25,0";

        let err = TaxYearLoader::parse_brackets(csv.as_bytes())
            .expect_err("Should fail for missing column");

        let TaxYearLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv = "tax_year,min_income,max_income,base_tax,rate\n";

        let records = TaxYearLoader::parse_brackets(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // assemble tests
    // =========================================================================

    #[test]
    fn test_assemble_sorts_rows() {
        let configs = parse_all(BRACKETS_CSV, THRESHOLDS_CSV, TIERS_CSV).expect("Failed to load");

        assert_eq!(configs.len(), 1);
        let config = &configs[0];
        let mins: Vec<_> = config.brackets.iter().map(|b| b.min_income).collect();
        assert_eq!(mins, vec![dec!(0), dec!(18201), dec!(45001)]);
        assert_eq!(config.repayment_tiers[0].min_income, dec!(54435));
        assert_eq!(config.medicare.single_threshold, dec!(26000));
        assert_eq!(config.surcharge.family.tier2, dec!(302000));
        assert_eq!(config.super_guarantee_rate, dec!(0.115));
    }

    #[test]
    fn test_assemble_requires_thresholds() {
        let thresholds = THRESHOLDS_CSV.replace("2024-25", "2023-24");

        let err = parse_all(BRACKETS_CSV, &thresholds, "tax_year,min_income,rate\n")
            .expect_err("Should fail without thresholds");

        assert!(matches!(
            err,
            TaxYearLoaderError::MissingThresholds(year) if year == TaxYear::starting(2024)
        ));
    }

    #[test]
    fn test_assemble_rejects_duplicate_thresholds() {
        let mut thresholds = THRESHOLDS_CSV.to_string();
        thresholds.push_str(THRESHOLDS_CSV.lines().nth(1).unwrap());

        let err = parse_all(BRACKETS_CSV, &thresholds, TIERS_CSV)
            .expect_err("Should fail for duplicate thresholds");

        assert!(matches!(err, TaxYearLoaderError::DuplicateThresholds(_)));
    }

    #[test]
    fn test_assemble_validates_continuity() {
        let brackets = BRACKETS_CSV.replace("4288", "5000");

        let err = parse_all(&brackets, THRESHOLDS_CSV, TIERS_CSV)
            .expect_err("Should fail for discontinuous brackets");

        let TaxYearLoaderError::InvalidConfig { source, .. } = err else {
            panic!("Expected InvalidConfig, got: {:?}", err);
        };
        assert!(matches!(source, ConfigError::BracketDiscontinuity { index: 2, .. }));
    }

    #[test]
    fn test_assemble_validates_tier_order() {
        let tiers = "tax_year,min_income,rate\n2024-25,54435,0.01\n2024-25,54435,0.02\n";

        let err = parse_all(BRACKETS_CSV, THRESHOLDS_CSV, tiers)
            .expect_err("Should fail for repeated tier minimum");

        assert!(matches!(
            err,
            TaxYearLoaderError::InvalidConfig {
                source: ConfigError::RepaymentTiersNotAscending { index: 1 },
                ..
            }
        ));
    }
}

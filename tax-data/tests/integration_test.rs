//! Checks over the tax tables shipped with the crate.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tax_core::calculations::{
    EngineSettings, FinancialSnapshotEngine, IncomeTaxSchedule, LevyCalculator, LevyInput,
};
use tax_core::db::{DataSourceConfig, RepositoryRegistry};
use tax_core::{PersonalProfile, RelationshipStatus, TaxYear, TaxYearRepository};
use tax_data::{BuiltinFactory, CsvDirectoryFactory, InMemoryTaxYearRepository};

fn builtin() -> InMemoryTaxYearRepository {
    InMemoryTaxYearRepository::builtin().expect("builtin tables load")
}

#[test]
fn every_shipped_year_validates() {
    let repo = builtin();

    for year in repo.list_tax_years().unwrap() {
        let config = repo.get_tax_year_config(year).unwrap();
        assert_eq!(config.validate(), Ok(()), "{year} failed validation");
    }
}

#[test]
fn brackets_are_continuous_for_every_year() {
    let repo = builtin();

    for year in repo.list_tax_years().unwrap() {
        let config = repo.get_tax_year_config(year).unwrap();
        let schedule = IncomeTaxSchedule::new(&config.brackets);

        for pair in config.brackets.windows(2) {
            let max = pair[0].max_income.expect("only the last bracket is unbounded");
            let at_max = schedule.calculate(max).unwrap();
            let at_next_min = schedule.calculate(pair[1].min_income).unwrap();

            assert!(
                (at_next_min - at_max).abs() <= Decimal::ONE,
                "{year}: tax jumps from {at_max} to {at_next_min} at {max}"
            );
        }
    }
}

#[test]
fn scenario_a_from_shipped_2024_tables() {
    let config = builtin()
        .get_tax_year_config(TaxYear::starting(2024))
        .unwrap();

    let gross_tax = IncomeTaxSchedule::new(&config.brackets)
        .calculate(dec!(100000))
        .unwrap();
    let levies = LevyCalculator::new(&config).calculate(&LevyInput {
        taxable_income: dec!(100000),
        gross_tax,
        dependents: 0,
        relationship: RelationshipStatus::Single,
        spouse_income: dec!(0),
        has_private_health: true,
        has_education_debt: true,
    });

    assert_eq!(gross_tax, dec!(20787.70));
    assert_eq!(levies.low_income_offset, dec!(0));
    assert_eq!(levies.net_tax_payable, dec!(20787.70));
    assert_eq!(levies.medicare_levy, dec!(2000.00));
    assert_eq!(levies.compulsory_repayment, dec!(10500));
}

#[test]
fn scenario_a_snapshot_super_guarantee() {
    let config = builtin()
        .get_tax_year_config(TaxYear::starting(2024))
        .unwrap();
    let settings = EngineSettings::default();
    let profile = PersonalProfile {
        gross_income: dec!(100000),
        has_private_health: true,
        has_education_debt: true,
        ..PersonalProfile::new(TaxYear::starting(2024))
    };

    let report = FinancialSnapshotEngine::new(&config, &settings)
        .calculate(&profile, &[])
        .unwrap();

    assert_eq!(report.snapshot.super_guarantee, dec!(11500.00));
    assert_eq!(report.snapshot.compulsory_repayment, dec!(10500));
}

#[test]
fn registry_routes_to_both_backends() {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(BuiltinFactory));
    registry.register(Box::new(CsvDirectoryFactory));

    let from_builtin = registry.create(&DataSourceConfig::default()).unwrap();
    let from_dir = registry
        .create(&DataSourceConfig {
            backend: "csv".to_string(),
            location: concat!(env!("CARGO_MANIFEST_DIR"), "/data").to_string(),
        })
        .unwrap();

    assert_eq!(registry.available_backends(), vec!["builtin", "csv"]);
    assert_eq!(from_builtin.list_tax_years(), from_dir.list_tax_years());
    assert_eq!(
        from_builtin.get_tax_year_config(TaxYear::starting(2025)),
        from_dir.get_tax_year_config(TaxYear::starting(2025))
    );
}

//! End-to-end: CSV import, JSON persistence and recompute.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tax_cli::app::evaluate;
use tax_cli::csv_loader;
use tax_cli::report::{OutputFormat, render};
use tax_cli::storage::StateStore;
use tax_core::calculations::{EngineSettings, FinancialReport, Gearing, recompute};
use tax_core::{LoanType, RentalIncome, ScenarioState, TaxYear};
use tax_data::InMemoryTaxYearRepository;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn populated_state() -> ScenarioState {
    let mut state = ScenarioState::new(TaxYear::starting(2024));
    state.profile.gross_income = dec!(100000);
    state.profile.has_private_health = true;
    state.profile.has_education_debt = true;

    let properties = csv_loader::load_from_file(&fixture("sample_properties.csv"))
        .expect("fixture parses");
    for property in properties {
        state.add_property(property).unwrap();
    }
    state
}

// =============================================================================
// CSV fixture
// =============================================================================

#[test]
fn fixture_imports_three_properties() {
    let state = populated_state();

    let names: Vec<_> = state.properties.iter().map(|p| p.name.as_str()).collect();

    assert_eq!(names, vec!["Carlton Unit", "Geelong House", "Ballarat Cottage"]);
    assert_eq!(state.next_property_id, 4);
}

#[test]
fn fixture_fields_are_coerced() {
    let state = populated_state();
    let carlton = &state.properties[0];
    let geelong = &state.properties[1];
    let ballarat = &state.properties[2];

    assert_eq!(carlton.value, dec!(620000));
    assert_eq!(carlton.loan.offset_balance, dec!(50000));
    assert_eq!(carlton.expenses.depreciation, Some(dec!(4500)));
    assert_eq!(carlton.expenses.agent_fee, None);
    assert_eq!(geelong.loan.loan_type, LoanType::InterestOnly);
    assert_eq!(geelong.rental_income, RentalIncome::Annual(dec!(31200)));
    assert_eq!(ballarat.loan.balance, Decimal::ZERO);
    assert_eq!(ballarat.loan.term_years, 0);
}

// =============================================================================
// Persistence round trip
// =============================================================================

#[test]
fn saved_state_recomputes_to_identical_report() {
    let repository = InMemoryTaxYearRepository::builtin().unwrap();
    let settings = EngineSettings::default();
    let state = populated_state();
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("scenario.json"));

    let before = recompute(&repository, &state, &settings).unwrap();
    store.save(&state).unwrap();
    let after = evaluate(&repository, &store, &settings).unwrap();

    assert_eq!(store.load().unwrap(), state);
    assert_eq!(after, before);
}

#[test]
fn report_json_round_trips() {
    let repository = InMemoryTaxYearRepository::builtin().unwrap();
    let report = recompute(&repository, &populated_state(), &EngineSettings::default()).unwrap();

    let json = render(&report, OutputFormat::Json).unwrap();
    let parsed: FinancialReport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, report);
}

// =============================================================================
// Aggregation through the whole stack
// =============================================================================

#[test]
fn portfolio_net_is_sum_of_property_results() {
    let repository = InMemoryTaxYearRepository::builtin().unwrap();

    let report = recompute(&repository, &populated_state(), &EngineSettings::default()).unwrap();
    let summed: Decimal = report.properties.iter().map(|p| p.net_result).sum();

    assert_eq!(report.properties.len(), 3);
    assert_eq!(report.snapshot.portfolio_net_result, summed);
    assert_eq!(report.snapshot.portfolio_gearing, Gearing::from_net_result(summed));
}

#[test]
fn scenario_without_properties_matches_salary_only_figures() {
    let repository = InMemoryTaxYearRepository::builtin().unwrap();
    let mut state = populated_state();
    state.properties.clear();

    let report = recompute(&repository, &state, &EngineSettings::default()).unwrap();

    assert_eq!(report.snapshot.taxable_income, dec!(100000));
    assert_eq!(report.snapshot.gross_tax, dec!(20787.70));
    assert_eq!(report.snapshot.medicare_levy, dec!(2000.00));
    assert_eq!(report.snapshot.compulsory_repayment, dec!(10500));
    assert_eq!(report.snapshot.monthly_take_home, dec!(6601.03));
}

#[test]
fn table_output_lists_every_property() {
    let repository = InMemoryTaxYearRepository::builtin().unwrap();
    let report = recompute(&repository, &populated_state(), &EngineSettings::default()).unwrap();

    let table = render(&report, OutputFormat::Table).unwrap();

    assert!(table.contains("Monthly surplus"));
    assert!(table.contains("2024-25"));
    for name in ["Carlton Unit", "Geelong House", "Ballarat Cottage"] {
        assert!(table.contains(name), "missing {name} in\n{table}");
    }
}

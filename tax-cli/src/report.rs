//! Rendering a [`FinancialReport`] for the terminal.

use clap::ValueEnum;
use rust_decimal::Decimal;
use tabled::{Table, builder::Builder, settings::Style};
use tax_core::TaxYear;
use tax_core::calculations::{
    BreakEvenOffset, FinancialReport, OverallFinancialSnapshot, PropertySummary,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Renders `report` in the requested format.
pub fn render(
    report: &FinancialReport,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Table => {
            let mut out = snapshot_table(&report.snapshot);
            if !report.properties.is_empty() {
                out.push_str("\n\n");
                out.push_str(&property_table(&report.properties));
            }
            if let Some(note) = unreachable_note(&report.properties) {
                out.push_str("\n");
                out.push_str(&note);
            }
            Ok(out)
        }
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn percent(rate: Decimal) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}

fn finish(builder: Builder) -> String {
    let mut table: Table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn snapshot_table(snapshot: &OverallFinancialSnapshot) -> String {
    let rows: [(&str, String); 19] = [
        ("Tax year", snapshot.tax_year.to_string()),
        ("Assessable income", money(snapshot.total_assessable_income)),
        ("Deductions", money(snapshot.total_deductions)),
        ("Taxable income", money(snapshot.taxable_income)),
        ("Gross tax", money(snapshot.gross_tax)),
        ("Marginal rate", percent(snapshot.marginal_rate)),
        ("Low income offset", money(snapshot.low_income_offset)),
        ("Net tax payable", money(snapshot.net_tax_payable)),
        ("Medicare levy", money(snapshot.medicare_levy)),
        ("Medicare levy surcharge", money(snapshot.medicare_levy_surcharge)),
        ("Compulsory repayment", money(snapshot.compulsory_repayment)),
        ("Super guarantee", money(snapshot.super_guarantee)),
        ("Monthly take-home", money(snapshot.monthly_take_home)),
        ("Monthly loan repayments", money(snapshot.monthly_loan_repayments)),
        ("Monthly living expenses", money(snapshot.monthly_living_expenses)),
        ("Monthly surplus", money(snapshot.monthly_surplus)),
        ("Total equity", money(snapshot.total_equity)),
        ("Portfolio net result", money(snapshot.portfolio_net_result)),
        ("Portfolio gearing", snapshot.portfolio_gearing.as_str().to_string()),
    ];

    let mut builder = Builder::default();
    builder.push_record(["Item", "Amount"]);
    for (label, value) in rows {
        builder.push_record([label.to_string(), value]);
    }
    finish(builder)
}

fn break_even_cell(break_even: &BreakEvenOffset) -> String {
    match break_even {
        BreakEvenOffset::AlreadyNeutral => "not needed".to_string(),
        BreakEvenOffset::Required(offset) => money(*offset),
        BreakEvenOffset::Unreachable { remaining_loss, .. } => {
            format!("unreachable (-{})", money(*remaining_loss))
        }
    }
}

/// Names the properties that still lose money with the whole loan offset.
fn unreachable_note(summaries: &[PropertySummary]) -> Option<String> {
    let ids: Vec<_> = summaries
        .iter()
        .filter(|s| !s.break_even.is_reachable())
        .map(|s| s.id.to_string())
        .collect();

    if ids.is_empty() {
        return None;
    }
    Some(format!("Cannot break even with a full offset: {}", ids.join(", ")))
}

pub fn property_table(summaries: &[PropertySummary]) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Id",
        "Property",
        "Rent",
        "Deductions",
        "Net",
        "Gearing",
        "Equity",
        "Repayment / mo",
        "Break-even offset",
    ]);
    for summary in summaries {
        builder.push_record([
            summary.id.to_string(),
            summary.name.clone(),
            money(summary.annual_rental_income),
            money(summary.total_deductible_expenses),
            money(summary.net_result),
            summary.gearing.as_str().to_string(),
            money(summary.equity),
            money(summary.monthly_repayment),
            break_even_cell(&summary.break_even),
        ]);
    }
    finish(builder)
}

/// One line per year, latest last.
pub fn years_list(years: &[TaxYear]) -> String {
    years
        .iter()
        .map(TaxYear::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::PropertyId;
    use tax_core::calculations::{ExpenseBreakdown, Gearing};

    use super::*;

    fn summary(id: u32) -> PropertySummary {
        PropertySummary {
            id: PropertyId(id),
            name: format!("Property {id}"),
            annual_rental_income: dec!(26000),
            expenses: ExpenseBreakdown::default(),
            total_deductible_expenses: dec!(26000),
            net_result: dec!(0),
            equity: dec!(200000),
            monthly_repayment: dec!(2000),
            break_even: BreakEvenOffset::AlreadyNeutral,
            gearing: Gearing::Neutral,
        }
    }

    #[test]
    fn break_even_cells() {
        assert_eq!(break_even_cell(&BreakEvenOffset::AlreadyNeutral), "not needed");
        assert_eq!(
            break_even_cell(&BreakEvenOffset::Required(dec!(123456.7))),
            "123456.70"
        );
        assert_eq!(
            break_even_cell(&BreakEvenOffset::Unreachable {
                full_offset: dec!(400000),
                remaining_loss: dec!(1500),
            }),
            "unreachable (-1500.00)"
        );
    }

    #[test]
    fn unreachable_note_lists_only_unreachable_properties() {
        let mut reachable = summary(1);
        reachable.break_even = BreakEvenOffset::Required(dec!(1000));
        let mut unreachable = summary(2);
        unreachable.break_even = BreakEvenOffset::Unreachable {
            full_offset: dec!(400000),
            remaining_loss: dec!(1500),
        };

        let note = unreachable_note(&[reachable.clone(), unreachable]);

        assert_eq!(note.as_deref(), Some("Cannot break even with a full offset: #2"));
        assert_eq!(unreachable_note(&[reachable]), None);
    }

    #[test]
    fn marginal_rate_renders_as_percent() {
        assert_eq!(percent(dec!(0.30)), "30.00%");
        assert_eq!(percent(dec!(0.325)), "32.50%");
    }

    #[test]
    fn years_list_is_one_per_line() {
        let years = [TaxYear::starting(2023), TaxYear::starting(2024)];

        assert_eq!(years_list(&years), "2023-24\n2024-25");
    }

    #[test]
    fn money_pads_to_cents() {
        assert_eq!(money(dec!(6601.03)), "6601.03");
        assert_eq!(money(dec!(-12)), "-12.00");
    }
}

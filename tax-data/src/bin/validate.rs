use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tax_core::TaxYearRepository;
use tax_core::calculations::IncomeTaxSchedule;
use tax_data::InMemoryTaxYearRepository;

/// Validate tax year tables and print a summary of each year.
///
/// The directory must contain:
/// - brackets.csv: tax_year, min_income, max_income (empty for unlimited), base_tax, rate
/// - thresholds.csv: one row per year of levy, surcharge, offset and super constants
/// - repayment_tiers.csv: tax_year, min_income, rate
///
/// Without `--dir` the tables compiled into the crate are checked.
#[derive(Parser, Debug)]
#[command(name = "tax-data-validate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the three CSV tables
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let repo = match &args.dir {
        Some(dir) => InMemoryTaxYearRepository::from_dir(dir)
            .with_context(|| format!("Failed to load tables from: {}", dir.display()))?,
        None => InMemoryTaxYearRepository::builtin().context("Built-in tables are invalid")?,
    };

    let years = repo.list_tax_years().context("Failed to list tax years")?;
    println!("{} tax years valid.", years.len());

    for year in years {
        let config = repo
            .get_tax_year_config(year)
            .with_context(|| format!("Failed to read {year}"))?;
        let schedule = IncomeTaxSchedule::new(&config.brackets);
        let top_rate = config.brackets.last().map(|b| b.tax_rate).unwrap_or_default();

        println!(
            "{year}: {} brackets (top rate {top_rate}), {} repayment tiers, SG {}, tax on 100000 = {}",
            config.brackets.len(),
            config.repayment_tiers.len(),
            config.super_guarantee_rate,
            schedule
                .calculate(Decimal::from(100_000))
                .with_context(|| format!("Failed to evaluate brackets for {year}"))?,
        );
    }

    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tax_cli::app::{self, evaluate, open_repository, resolve_year};
use tax_cli::csv_loader;
use tax_cli::logging::{self, LogOptions};
use tax_cli::report::{OutputFormat, render, years_list};
use tax_cli::settings::{DEFAULT_SETTINGS_FILE, Settings};
use tax_cli::storage::StateStore;
use tax_cli::watch::Watch;
use tax_core::{ScenarioState, TaxYear};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal tax and rental property gearing estimator.
///
/// Keeps a scenario (income profile plus investment properties) in a JSON
/// file and recomputes the household position from the tax tables for the
/// scenario's year.
#[derive(Debug, Parser)]
#[command(name = "gearing", version)]
struct Cli {
    /// Settings file. Missing means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Log filter, e.g. `debug` or `tax_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Silence log output on the console.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tax years the configured data source provides.
    Years,

    /// Write an empty scenario.
    Init {
        #[arg(long)]
        state: PathBuf,

        /// Tax year such as `2024-25`. Defaults to the settings, then the
        /// latest available year.
        #[arg(long)]
        year: Option<TaxYear>,

        /// Replace an existing state file.
        #[arg(long)]
        force: bool,
    },

    /// Append properties from a CSV file to a scenario.
    Import {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long)]
        state: PathBuf,
    },

    /// Recompute a scenario and print the result.
    Snapshot {
        #[arg(long)]
        state: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Recompute whenever the state file changes and then stays unchanged
    /// for the quiet period.
    Watch {
        #[arg(long)]
        state: PathBuf,

        /// Quiet period in milliseconds. Defaults to the settings value.
        #[arg(long)]
        quiet_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

// ─── logging ─────────────────────────────────────────────────────────────────

fn log_options(cli: &Cli) -> LogOptions {
    LogOptions {
        level: cli.log_level.clone(),
        file: cli.log_file.clone(),
        quiet: cli.quiet,
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&log_options(&cli))?;
    debug!(app = logging::app_name(), "starting");

    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;
    let repository = open_repository(&settings.data).with_context(|| {
        format!(
            "opening '{}' tax tables (available: {:?})",
            settings.data.backend,
            app::build_registry().available_backends()
        )
    })?;

    match cli.command {
        Command::Years => {
            let years = repository.list_tax_years()?;
            println!("{}", years_list(&years));
        }

        Command::Init { state, year, force } => {
            let store = StateStore::new(state);
            if store.exists() && !force {
                bail!(
                    "{} already exists; pass --force to replace it",
                    store.path().display()
                );
            }

            let year = resolve_year(&*repository, year.or(settings.default_year))?;
            repository
                .get_tax_year_config(year)
                .with_context(|| format!("no tax tables for {year}"))?;

            store.save(&ScenarioState::new(year))?;
            info!(path = %store.path().display(), %year, "created scenario");
        }

        Command::Import { csv, state } => {
            let store = StateStore::new(state);
            let mut scenario = store.load()?;
            let properties = csv_loader::load_from_file(&csv)
                .with_context(|| format!("importing {}", csv.display()))?;

            let count = properties.len();
            for property in properties {
                let id = scenario.add_property(property)?;
                if let Some(added) = scenario.property(id) {
                    debug!(%id, name = %added.name, "added property");
                }
            }

            store.save(&scenario)?;
            info!(
                added = count,
                total = scenario.properties.len(),
                path = %store.path().display(),
                "imported properties"
            );
        }

        Command::Snapshot { state, format } => {
            let store = StateStore::new(state);
            let report = evaluate(&*repository, &store, &settings.engine)
                .with_context(|| format!("evaluating {}", store.path().display()))?;
            println!("{}", render(&report, format)?);
        }

        Command::Watch {
            state,
            quiet_ms,
            format,
        } => {
            let store = StateStore::new(state);
            let quiet = Duration::from_millis(quiet_ms.unwrap_or(settings.debounce_ms));
            Watch::new(&*repository, &store, &settings.engine, format)
                .run(quiet)
                .await?;
        }
    }

    Ok(())
}

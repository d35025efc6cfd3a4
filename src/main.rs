use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use configuration::{Config, DEFAULT_SECTION, init_logging, load_config_with_section};
use database::{DEFAULT_CHUNK_CELLS, Database, WriteMode};
use stats_client::{Dataset, FetchParams, create_source};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use validator::{CatalogRegistry, Validator, ValidatorError};

/// The entry point for the kickstat application.
#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            return ExitCode::from(EXIT_OTHER);
        }
    };

    // Held until exit so buffered log lines reach the file.
    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            return ExitCode::from(EXIT_OTHER);
        }
    };

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Tables => handle_tables(&config).await,
        Commands::Fetch(args) => handle_fetch(args, &config).await,
        Commands::Validate(args) => handle_validate(args, &config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

const EXIT_FAIL: u8 = 1;
const EXIT_ABORT: u8 = 2;
const EXIT_OTHER: u8 = 3;

/// Lets a calling pipeline tell a critical validation failure from a
/// reportable one.
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<ValidatorError>() {
        Some(ValidatorError::Abort(_)) => EXIT_ABORT,
        Some(ValidatorError::Fail(_)) => EXIT_FAIL,
        _ => EXIT_OTHER,
    }
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    load_config_with_section(&cli.config, &cli.section)
        .with_context(|| format!("failed to read {} (section [{}])", cli.config.display(), cli.section))
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Fetches AFL statistics into PostgreSQL and validates what is stored there.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (.toml or .ini).
    #[arg(long, global = true, default_value = "config/config.toml")]
    config: PathBuf,

    /// The config section holding the database credentials to use.
    #[arg(long, global = true, default_value = DEFAULT_SECTION)]
    section: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables in the database.
    Tables,
    /// Fetch a dataset from the statistics source.
    Fetch(FetchArgs),
    /// Run a validation catalog against the database.
    Validate(ValidateArgs),
}

#[derive(Parser)]
struct FetchArgs {
    /// results, fixture, ladder, lineup or player-stats.
    dataset: Dataset,

    /// The season to fetch (defaults to the current year).
    #[arg(long)]
    season: Option<i32>,

    /// The round to fetch (defaults to every round).
    #[arg(long)]
    round: Option<i32>,

    /// Only keep rows involving this team.
    #[arg(long)]
    team: Option<String>,

    /// Write the fetched rows to this table.
    #[arg(long)]
    save: Option<String>,

    /// What to do when the table already exists.
    #[arg(long, value_enum, default_value_t = SaveMode::Fail)]
    mode: SaveMode,
}

#[derive(Parser)]
struct ValidateArgs {
    /// The catalog to run (defaults to `validation.catalog` from the config).
    #[arg(long)]
    catalog: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SaveMode {
    Replace,
    Append,
    Fail,
}

impl From<SaveMode> for WriteMode {
    fn from(mode: SaveMode) -> Self {
        match mode {
            SaveMode::Replace => WriteMode::Replace,
            SaveMode::Append => WriteMode::Append,
            SaveMode::Fail => WriteMode::Fail,
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_tables(config: &Config) -> anyhow::Result<()> {
    let db = Database::connect(config).await?;
    let tables = db.list_tables().await;
    db.close().await;
    for table in tables? {
        println!("{}", table);
    }
    Ok(())
}

async fn handle_fetch(args: FetchArgs, config: &Config) -> anyhow::Result<()> {
    let source = create_source(&config.source)?;
    let params = FetchParams {
        season: args.season,
        round: args.round,
        team: args.team,
    };
    let table = source
        .fetch(args.dataset, &params)
        .await
        .with_context(|| format!("failed to fetch {} from {}", args.dataset, source.name()))?;

    println!("{}", render(&table));
    let (rows, columns) = table.shape();
    println!("{} rows x {} columns", rows, columns);

    if let Some(name) = args.save {
        let db = Database::connect(config).await?;
        let written = save(&db, &name, &table, args.mode.into()).await;
        db.close().await;
        let written = written?;
        println!("Saved {} rows to {}", written, name);
    }
    Ok(())
}

async fn save(
    db: &Database,
    name: &str,
    table: &core_types::Table,
    mode: WriteMode,
) -> anyhow::Result<u64> {
    let mut session = db.begin().await?;
    let written = session.write_table(name, table, mode, DEFAULT_CHUNK_CELLS).await;
    session.finish(written.is_ok()).await?;
    Ok(written?)
}

async fn handle_validate(args: ValidateArgs, config: &Config) -> anyhow::Result<()> {
    let registry = CatalogRegistry::builtin().with_configured(&config.validation.catalogs)?;
    let key = args.catalog.unwrap_or_else(|| config.validation.catalog.clone());
    let catalog = registry.get(&key)?;

    let db = Database::connect(config).await?;
    let validator = Validator::new(Arc::new(db.clone()), catalog)
        .with_query_timeout(config.validation.query_timeout_secs.map(Duration::from_secs));
    let result = validator.run().await;
    db.close().await;

    let report = result?;
    println!(
        "{}: {} validations passed, {} skipped",
        key,
        report.evaluated - report.skipped.len(),
        report.skipped.len()
    );
    for outcome in &report.skipped {
        println!("  skipped {}", outcome.describe());
    }
    Ok(())
}

fn render(table: &core_types::Table) -> comfy_table::Table {
    let mut grid = comfy_table::Table::new();
    grid.load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(table.columns().to_vec());
    for row in table.rows() {
        grid.add_row(row.iter().map(|value| value.to_string()).collect::<Vec<_>>());
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Severity, ValidationDefinition, Value};
    use validator::{AbortError, FailError, ValidationOutcome};

    fn outcome(severity: Severity) -> Vec<ValidationOutcome> {
        vec![ValidationOutcome::new(
            ValidationDefinition::new("check", "SELECT 1", severity),
            vec![vec![Value::Int(1)]],
        )]
    }

    #[test]
    fn exit_codes_distinguish_abort_from_fail() {
        let abort = anyhow::Error::from(ValidatorError::from(AbortError { outcomes: outcome(Severity::Abort) }));
        let fail = anyhow::Error::from(ValidatorError::from(FailError { outcomes: outcome(Severity::Fail) }));
        let other = anyhow::Error::from(ValidatorError::CatalogNotFound("x".into()));

        assert_eq!(exit_code(&abort), EXIT_ABORT);
        assert_eq!(exit_code(&fail), EXIT_FAIL);
        assert_eq!(exit_code(&other), EXIT_OTHER);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_OTHER);
    }

    #[test]
    fn cli_parses_fetch_with_save_mode() {
        let cli = Cli::try_parse_from([
            "kickstat", "fetch", "player_stats", "--season", "2020", "--save", "stats", "--mode", "append",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("config/config.toml"));
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.dataset, Dataset::PlayerStats);
                assert_eq!(args.season, Some(2020));
                assert_eq!(args.save.as_deref(), Some("stats"));
                assert!(matches!(args.mode, SaveMode::Append));
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn rendered_tables_show_nulls() {
        let table = core_types::Table::with_rows(
            vec!["id".into(), "venue".into()],
            vec![vec![Value::Int(1), Value::Null]],
        )
        .unwrap();
        let text = render(&table).to_string();
        assert!(text.contains("venue") && text.contains("NULL"), "{text}");
    }
}

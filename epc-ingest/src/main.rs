//! epc-ingest - catalog import command
//!
//! Reads a file of program records, runs the normalization pipeline against
//! the catalog database and writes a JSON migration report.
//!
//! Exit status: 0 when no record ended in an error, 2 when some did,
//! 1 when the run was aborted (unreadable input, unreachable database,
//! invalid configuration).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use epc_common::config::{resolve_toml_config, TomlConfig};
use epc_common::db::init::{init_database, init_memory_database};
use epc_ingest::config::{ConfigOverrides, IngestConfig};
use epc_ingest::db::runs::{entity_counts, latest_run};
use epc_ingest::input::load_records;
use epc_ingest::run_import;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "epc_ingest=info,epc_common=info";
const VERBOSE_FILTER: &str = "epc_ingest=debug,epc_common=debug";

/// Command-line arguments for epc-ingest
#[derive(Parser, Debug)]
#[command(name = "epc-ingest")]
#[command(about = "Normalize enrichment program records into the catalog database")]
#[command(version)]
struct Cli {
    /// TOML configuration file (default: ~/.config/epc/ingest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database path
    #[arg(long, global = true, env = "EPC_DATABASE")]
    database: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON or JSON Lines file of program records
    Import(ImportArgs),
    /// Print catalog row counts and the most recent run as JSON
    Stats,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Input file
    input: PathBuf,

    /// Directory for the migration report
    #[arg(long, env = "EPC_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Records per batch
    #[arg(long, env = "EPC_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(long, env = "EPC_BATCH_DELAY_MS")]
    batch_delay_ms: Option<u64>,

    /// Maximum time to wait on a locked database in milliseconds
    #[arg(long, env = "EPC_MAX_LOCK_WAIT_MS")]
    max_lock_wait_ms: Option<u64>,

    /// Run against an in-memory database; only the report is written
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let toml = resolve_toml_config(cli.config.as_deref()).context("Failed to load configuration file")?;
    init_tracing(cli.verbose, &toml);

    info!("Starting epc-ingest {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Import(args) => {
            let overrides = ConfigOverrides {
                database_path: cli.database,
                report_dir: args.report_dir,
                batch_size: args.batch_size,
                batch_delay_ms: args.batch_delay_ms,
                max_lock_wait_ms: args.max_lock_wait_ms,
            };
            let config = IngestConfig::resolve(overrides, &toml).context("Invalid configuration")?;
            import(config, args.input, args.dry_run).await
        }
        Command::Stats => {
            let overrides = ConfigOverrides {
                database_path: cli.database,
                ..Default::default()
            };
            let config = IngestConfig::resolve(overrides, &toml).context("Invalid configuration")?;
            stats(config).await
        }
    }
}

/// Install the tracing subscriber
///
/// RUST_LOG wins, then --verbose, then the configuration file's filter.
fn init_tracing(verbose: bool, toml: &TomlConfig) {
    let fallback = if verbose {
        VERBOSE_FILTER.to_string()
    } else {
        toml.logging
            .filter
            .clone()
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn import(config: IngestConfig, input: PathBuf, dry_run: bool) -> Result<ExitCode> {
    let records = load_records(&input).context("Failed to load input")?;

    let pool = if dry_run {
        info!("Dry run: using an in-memory database");
        init_memory_database().await
    } else {
        init_database(&config.database_path).await
    }
    .context("Failed to open catalog database")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping after the current record");
            signal_cancel.cancel();
        }
    });

    let input_path = input.display().to_string();
    let report = run_import(pool.clone(), config.clone(), &input_path, &records, &cancel)
        .await
        .context("Import aborted")?;
    pool.close().await;

    let report_path = report
        .write_to_dir(&config.report_dir)
        .context("Failed to write migration report")?;

    let counters = report.counters();
    info!(report = %report_path.display(), "Migration report written");
    println!(
        "{}: total={} created={} updated={} skipped={} errors={}{}",
        report_path.display(),
        counters.total,
        counters.created,
        counters.updated,
        counters.skipped,
        counters.errors,
        if report.cancelled() { " (cancelled)" } else { "" }
    );

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

async fn stats(config: IngestConfig) -> Result<ExitCode> {
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open catalog database")?;

    let counts = entity_counts(&pool).await.context("Failed to count catalog rows")?;
    let latest = latest_run(&pool).await.context("Failed to read run ledger")?;
    pool.close().await;

    let summary = serde_json::json!({
        "database": config.database_path.display().to_string(),
        "counts": counts,
        "latest_run": latest,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(ExitCode::SUCCESS)
}

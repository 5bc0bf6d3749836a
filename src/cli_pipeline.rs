use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use fishery_stats_server::cli::{parse_path, CommonArgs};
use fishery_stats_server::config::{AppConfig, DatasetConfig};
use fishery_stats_server::importer::CsvImporter;
use fishery_stats_server::logging::init_logging;
use fishery_stats_server::pipeline::{AggregationEngine, InterpolationNormalizer};
use fishery_stats_server::store::{OpenMode, SqliteTableStore};

#[derive(Parser, Debug)]
#[clap(about = "Imports, normalizes and derives the fishery tables")]
struct CliArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// Directory holding the semicolon-separated source files.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Load every matching CSV file into its table.
    Import,
    /// Fill interior gaps of the raw tables.
    Normalize,
    /// Compute the derived series.
    Derive,
    /// Import, normalize and derive.
    All,
}

fn import(config: &AppConfig, dataset: &Arc<DatasetConfig>) -> Result<()> {
    let importer = CsvImporter::new(&config.db_path, dataset.clone());
    let summary = importer
        .import_dir(&config.data_dir)
        .context("Import failed")?;
    info!(
        "Imported {} tables ({} files skipped, {} failed)",
        summary.imported.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    Ok(())
}

fn normalize(config: &AppConfig, dataset: &Arc<DatasetConfig>) -> Result<()> {
    let store = SqliteTableStore::open(
        &config.db_path,
        OpenMode::ExistingOnly,
        dataset.identifier_allow_list(),
    )
    .context("Cannot open the database, run the import first")?;
    let summary = InterpolationNormalizer::new(Arc::new(store), dataset.clone()).normalize_all();
    info!(
        "Normalized {} tables, {} values filled",
        summary.tables_processed(),
        summary.cells_filled()
    );
    Ok(())
}

fn derive(config: &AppConfig, dataset: &Arc<DatasetConfig>) -> Result<()> {
    let outcomes = AggregationEngine::new(&config.db_path, dataset.clone())
        .run_all()
        .context("Cannot open the database, run the import first")?;
    for outcome in &outcomes {
        let table = dataset.derived_table(outcome.series);
        match &outcome.result {
            Ok(rows) => info!("  {}: {} rows", table, rows),
            Err(err) => error!("  {}: {}", table, err),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let mut cli_config = cli_args.common.to_cli_config();
    cli_config.data_dir = cli_args.data_dir.clone();
    let config = AppConfig::load(&cli_config, cli_args.common.config.as_deref())?;

    let _log_guard = init_logging(config.log_dir.as_deref())?;
    let dataset = Arc::new(config.dataset.clone());

    match cli_args.command {
        Command::Import => import(&config, &dataset),
        Command::Normalize => normalize(&config, &dataset),
        Command::Derive => derive(&config, &dataset),
        Command::All => {
            import(&config, &dataset)?;
            normalize(&config, &dataset)?;
            derive(&config, &dataset)
        }
    }
}

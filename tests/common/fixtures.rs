//! Source files and pipeline runs for end-to-end tests
//!
//! Data summary:
//! - employment: Lazio 2019 is missing (filled to 2.0), Lombardia 2018 is
//!   missing at the edge (stays empty)
//! - economic importance: decimal commas
//! - productivity: Sicilia, Sardegna, Veneto over 2019-2020

use fishery_stats_server::config::DatasetConfig;
use fishery_stats_server::importer::CsvImporter;
use fishery_stats_server::pipeline::{AggregationEngine, InterpolationNormalizer};
use fishery_stats_server::store::{OpenMode, SqliteTableStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const EMPLOYMENT_CSV: &str = "\
Anno;Regione;Variazione percentuale unita di lavoro della pesca
2018;Lazio;1.0
2019;Lazio;
2020;Lazio;3.0
2018;Sicilia;2.0
2019;Sicilia;4.0
2020;Sicilia;6.0
2018;Lombardia;
2019;Lombardia;5.0
2020;Lombardia;7.0
";

const ECONOMIC_IMPORTANCE_CSV: &str = "\
Anno;Regione;Percentuale valore aggiunto pesca-piscicoltura-servizi
2019;Puglia;1,5
2020;Puglia;2,5
2019;Calabria;0,5
2020;Calabria;1,5
";

const PRODUCTIVITY_CSV: &str = "\
Anno;Regione;Produttivita in migliaia di euro
2019;Sicilia;100
2020;Sicilia;110
2019;Sardegna;50
2020;Sardegna;60
2019;Veneto;80
2020;Veneto;90
";

/// Writes the three source files into `data_dir`, named after their tables.
pub fn write_source_files(data_dir: &Path, dataset: &DatasetConfig) -> std::io::Result<()> {
    fs::create_dir_all(data_dir)?;
    for (table, content) in [
        (&dataset.employment_table, EMPLOYMENT_CSV),
        (&dataset.economic_importance_table, ECONOMIC_IMPORTANCE_CSV),
        (&dataset.productivity_table, PRODUCTIVITY_CSV),
    ] {
        fs::write(data_dir.join(format!("{}.csv", table)), content)?;
    }
    Ok(())
}

/// Import, normalize and derive, the way `cli-pipeline all` does.
pub fn run_full_pipeline(
    data_dir: &Path,
    db_path: &Path,
    dataset: Arc<DatasetConfig>,
) -> anyhow::Result<()> {
    let summary = CsvImporter::new(db_path, dataset.clone()).import_dir(data_dir)?;
    anyhow::ensure!(summary.failed.is_empty(), "import failures: {:?}", summary.failed);

    let store = SqliteTableStore::open(
        db_path,
        OpenMode::ExistingOnly,
        dataset.identifier_allow_list(),
    )?;
    let normalized = InterpolationNormalizer::new(Arc::new(store), dataset.clone()).normalize_all();
    anyhow::ensure!(
        normalized.failures.is_empty(),
        "normalization failures: {:?}",
        normalized.failures
    );

    for outcome in AggregationEngine::new(db_path, dataset).run_all()? {
        if let Err(err) = outcome.result {
            anyhow::bail!("derivation {:?} failed: {}", outcome.series, err);
        }
    }
    Ok(())
}

//! Loads the semicolon-delimited source files into the store, one table per file.

use crate::config::DatasetConfig;
use crate::store::{Cell, OpenMode, SqliteTableStore, StoreError, TableData, TableStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Data directory {0:?} does not exist or is not a directory")]
    DataDirMissing(PathBuf),

    #[error("Failed to list data directory: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Failed to parse {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("File {0:?} has no header row")]
    MissingHeader(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    /// (table, rows) for each table that was replaced.
    pub imported: Vec<(String, usize)>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ImportError)>,
}

pub struct CsvImporter {
    db_path: PathBuf,
    dataset: Arc<DatasetConfig>,
}

impl CsvImporter {
    pub fn new(db_path: impl Into<PathBuf>, dataset: Arc<DatasetConfig>) -> Self {
        Self {
            db_path: db_path.into(),
            dataset,
        }
    }

    /// Imports every `*.csv` in `data_dir` whose stem names a raw table.
    ///
    /// A missing directory or an unusable store fails the whole call; a
    /// file that cannot be parsed is logged and reported in the summary.
    pub fn import_dir(&self, data_dir: &Path) -> Result<ImportSummary, ImportError> {
        if !data_dir.is_dir() {
            error!("Data directory {:?} does not exist", data_dir);
            return Err(ImportError::DataDirMissing(data_dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == "csv")
            })
            .collect();
        files.sort();

        let mut summary = ImportSummary::default();
        if files.is_empty() {
            warn!("No CSV files found in {:?}", data_dir);
            return Ok(summary);
        }
        info!("Found {} CSV files in {:?}", files.len(), data_dir);

        let store = SqliteTableStore::open(
            &self.db_path,
            OpenMode::CreateIfMissing,
            self.dataset.identifier_allow_list(),
        )?;

        for path in files {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(raw) = self.dataset.raw_table_by_name(&stem) else {
                warn!(
                    "File {:?} does not match any configured table, skipping",
                    path.file_name().unwrap_or_default()
                );
                summary.skipped.push(path);
                continue;
            };

            let table = self.dataset.raw_table(raw);
            info!("Importing {:?} into table '{}'", path, table);
            match read_csv(&path).and_then(|data| {
                store.replace(table, &data)?;
                Ok(data.len())
            }) {
                Ok(rows) => {
                    info!("Imported {} rows into table '{}'", rows, table);
                    summary.imported.push((table.to_string(), rows));
                }
                Err(err) => {
                    error!("Failed to import {:?}: {}", path, err);
                    summary.failed.push((path, err));
                }
            }
        }

        info!(
            "Import completed: {} imported, {} skipped, {} failed",
            summary.imported.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

/// Parses a `;`-separated file with a header row into typed cells.
pub fn read_csv(path: &Path) -> Result<TableData, ImportError> {
    let csv_error = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(csv_error)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(ImportError::MissingHeader(path.to_path_buf()));
    }

    let mut data = TableData::new(columns);
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        data.rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(data)
}

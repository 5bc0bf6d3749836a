//! Read-only, year-filtered access to raw and derived tables.

use crate::config::{DatasetConfig, DerivedSeries, RawTable};
use crate::store::{Cell, Comparison, Condition, OpenMode, SqliteTableStore, StoreError, TableStore};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// One row as a JSON object whose keys keep the table's column order.
pub type RowRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Carries only a message safe to show to clients.
    #[error("{0}")]
    Internal(String),
}

#[derive(Clone)]
pub struct QueryService {
    db_path: PathBuf,
    dataset: Arc<DatasetConfig>,
}

impl QueryService {
    pub fn new(db_path: impl Into<PathBuf>, dataset: Arc<DatasetConfig>) -> Self {
        Self {
            db_path: db_path.into(),
            dataset,
        }
    }

    pub fn dataset(&self) -> &DatasetConfig {
        &self.dataset
    }

    /// Rows of `table` with `year_from <= year <= year_to`; both bounds are
    /// optional and inclusive.
    pub fn fetch(
        &self,
        table: &str,
        year_from: Option<i64>,
        year_to: Option<i64>,
    ) -> Result<Vec<RowRecord>, QueryError> {
        if let (Some(from), Some(to)) = (year_from, year_to) {
            if to < from {
                return Err(QueryError::InvalidArgument(
                    "'a_anno' must be greater than or equal to 'da_anno'".to_string(),
                ));
            }
        }

        let store = match SqliteTableStore::open(
            &self.db_path,
            OpenMode::ReadOnly,
            self.dataset.identifier_allow_list(),
        ) {
            Ok(store) => store,
            Err(StoreError::StoreUnavailable(path)) => {
                error!("Database {:?} not found, run the import first", path);
                return Err(QueryError::NotFound(format!(
                    "Database not found at {}",
                    path.display()
                )));
            }
            Err(err) => return Err(internal(table, err)),
        };

        let year_column = &self.dataset.year_column;
        let mut predicate = Vec::new();
        if let Some(from) = year_from {
            predicate.push(Condition::new(
                year_column,
                Comparison::AtLeast,
                Cell::Integer(from),
            ));
        }
        if let Some(to) = year_to {
            predicate.push(Condition::new(
                year_column,
                Comparison::AtMost,
                Cell::Integer(to),
            ));
        }
        debug!("Reading table '{}' with {:?}", table, predicate);

        let data = store
            .read(table, None, &predicate)
            .map_err(|err| internal(table, err))?;

        Ok(data
            .rows
            .iter()
            .map(|row| {
                data.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Cell::to_json))
                    .collect()
            })
            .collect())
    }

    pub fn fetch_raw(
        &self,
        table: RawTable,
        year_from: Option<i64>,
        year_to: Option<i64>,
    ) -> Result<Vec<RowRecord>, QueryError> {
        self.fetch(self.dataset.raw_table(table), year_from, year_to)
    }

    pub fn fetch_derived(
        &self,
        series: DerivedSeries,
        year_from: Option<i64>,
        year_to: Option<i64>,
    ) -> Result<Vec<RowRecord>, QueryError> {
        self.fetch(self.dataset.derived_table(series), year_from, year_to)
    }
}

fn internal(table: &str, err: StoreError) -> QueryError {
    error!("Failed to read table '{}': {}", table, err);
    QueryError::Internal(format!(
        "Internal server error while reading table '{}'",
        table
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TableData;
    use serde_json::json;
    use tempfile::TempDir;

    struct TestQuery {
        service: QueryService,
        _temp_dir: TempDir,
    }

    fn create_test_query() -> TestQuery {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("database.db");
        let dataset = Arc::new(DatasetConfig::default());
        let store = SqliteTableStore::open(
            &db_path,
            OpenMode::CreateIfMissing,
            dataset.identifier_allow_list(),
        )
        .unwrap();
        let d = &dataset;
        store
            .replace(
                &d.national_productivity_total_table,
                &TableData {
                    columns: vec![
                        d.year_column.clone(),
                        d.national_productivity_total_column.clone(),
                    ],
                    rows: (2015..=2020)
                        .map(|y| vec![Cell::Integer(y), Cell::Real(y as f64 / 10.0)])
                        .collect(),
                },
            )
            .unwrap();
        TestQuery {
            service: QueryService::new(db_path, dataset),
            _temp_dir: temp_dir,
        }
    }

    #[test]
    fn test_fetch_filters_inclusively() {
        let test = create_test_query();
        let rows = test
            .service
            .fetch_derived(DerivedSeries::NationalProductivityTotal, Some(2017), Some(2018))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            serde_json::Value::Object(rows[0].clone()),
            json!({
                "Anno": 2017,
                "Produttivita_Totale_Nazionale_Migliaia_Euro": 201.7
            })
        );
        let keys: Vec<&String> = rows[1].keys().collect();
        assert_eq!(
            keys,
            vec!["Anno", "Produttivita_Totale_Nazionale_Migliaia_Euro"]
        );
    }

    #[test]
    fn test_fetch_open_bounds() {
        let test = create_test_query();
        let series = DerivedSeries::NationalProductivityTotal;
        assert_eq!(test.service.fetch_derived(series, None, None).unwrap().len(), 6);
        assert_eq!(
            test.service.fetch_derived(series, Some(2019), None).unwrap().len(),
            2
        );
        assert_eq!(
            test.service.fetch_derived(series, None, Some(2015)).unwrap().len(),
            1
        );
        assert!(test
            .service
            .fetch_derived(series, Some(2030), None)
            .unwrap()
            .is_empty());
        assert_eq!(
            test.service.fetch_derived(series, Some(2016), Some(2016)).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        // No store file: the range must be rejected before any I/O.
        let service = QueryService::new(
            temp_dir.path().join("missing.db"),
            Arc::new(DatasetConfig::default()),
        );
        let result = service.fetch_raw(RawTable::Productivity, Some(2020), Some(2019));
        assert!(matches!(result, Err(QueryError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let service = QueryService::new(
            temp_dir.path().join("missing.db"),
            Arc::new(DatasetConfig::default()),
        );
        let result = service.fetch_raw(RawTable::Productivity, None, None);
        assert!(matches!(result, Err(QueryError::NotFound(_))));
        assert!(!temp_dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_missing_table_is_internal_without_detail() {
        let test = create_test_query();
        let err = test
            .service
            .fetch_raw(RawTable::EmploymentTrend, None, None)
            .unwrap_err();
        match err {
            QueryError::Internal(message) => assert!(!message.contains("does not exist")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

use super::{round2, PipelineError};
use crate::config::{DatasetConfig, DerivedSeries, RawTable};
use crate::store::{Cell, OpenMode, SqliteTableStore, StoreError, TableData, TableStore};
use crate::taxonomy::macro_region_of;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    National,
    MacroRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
}

impl Aggregation {
    /// Sum of nothing is 0, mean of nothing is undefined.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Mean if values.is_empty() => None,
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub series: DerivedSeries,
    pub source: RawTable,
    pub grouping: Grouping,
    pub aggregation: Aggregation,
}

impl Derivation {
    pub fn for_series(series: DerivedSeries) -> Self {
        let grouping = if series.is_macro_region() {
            Grouping::MacroRegion
        } else {
            Grouping::National
        };
        let aggregation = match series.source() {
            RawTable::Productivity => Aggregation::Sum,
            RawTable::EmploymentTrend | RawTable::EconomicImportance => Aggregation::Mean,
        };
        Self {
            series,
            source: series.source(),
            grouping,
            aggregation,
        }
    }

    pub fn all() -> Vec<Derivation> {
        DerivedSeries::ALL
            .into_iter()
            .map(Derivation::for_series)
            .collect()
    }
}

type GroupKey = (i64, Option<&'static str>);

/// Groups the source rows by year (and macro-region), aggregates the value
/// column and returns the derived table, ordered by year then macro-region.
///
/// Every region of a macro-region derivation must be known to the taxonomy,
/// otherwise the whole derivation fails with `MappingIncomplete`.
pub fn derive_series(
    derivation: &Derivation,
    source: &TableData,
    dataset: &DatasetConfig,
) -> Result<TableData, PipelineError> {
    let source_table = dataset.raw_table(derivation.source);
    let index_of = |column: &str| {
        source
            .column_index(column)
            .ok_or_else(|| PipelineError::ConfigurationKeyMissing {
                table: source_table.to_string(),
                column: column.to_string(),
            })
    };
    let year_idx = index_of(&dataset.year_column)?;
    let value_idx = index_of(dataset.raw_value_column(derivation.source))?;
    let region_idx = match derivation.grouping {
        Grouping::National => None,
        Grouping::MacroRegion => Some(index_of(&dataset.region_column)?),
    };

    if let Some(region_idx) = region_idx {
        let unmapped: BTreeSet<String> = source
            .rows
            .iter()
            .filter_map(|row| match row[region_idx].to_text() {
                Some(region) if macro_region_of(&region).is_some() => None,
                Some(region) => Some(region),
                None => Some("NULL".to_string()),
            })
            .collect();
        if !unmapped.is_empty() {
            return Err(PipelineError::MappingIncomplete(
                unmapped.into_iter().collect(),
            ));
        }
    }

    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    let mut dropped = 0;
    for row in &source.rows {
        let Some(year) = row[year_idx].as_i64() else {
            dropped += 1;
            continue;
        };
        let macro_label = region_idx
            .and_then(|idx| row[idx].to_text())
            .and_then(|region| macro_region_of(&region))
            .map(|m| m.label());
        let values = groups.entry((year, macro_label)).or_default();
        if let Some(value) = row[value_idx].as_f64() {
            values.push(value);
        }
    }
    if dropped > 0 {
        warn!(
            "Table '{}': ignored {} rows with a non-numeric year",
            source_table, dropped
        );
    }

    let mut columns = vec![dataset.year_column.clone()];
    if region_idx.is_some() {
        columns.push(dataset.macro_region_column.clone());
    }
    columns.push(dataset.derived_value_column(derivation.series).to_string());

    let rows = groups
        .into_iter()
        .map(|((year, macro_label), values)| {
            let mut row = vec![Cell::Integer(year)];
            if region_idx.is_some() {
                row.push(match macro_label {
                    Some(label) => Cell::Text(label.to_string()),
                    None => Cell::Null,
                });
            }
            row.push(Cell::from_f64(
                derivation.aggregation.apply(&values).map(round2),
            ));
            row
        })
        .collect();

    Ok(TableData { columns, rows })
}

/// Reads the source columns, derives the series and replaces its table.
/// Returns the number of rows written.
pub fn run_derivation(
    store: &dyn TableStore,
    dataset: &DatasetConfig,
    derivation: &Derivation,
) -> Result<usize, PipelineError> {
    let source_table = dataset.raw_table(derivation.source);
    let mut columns = vec![dataset.year_column.as_str()];
    if derivation.grouping == Grouping::MacroRegion {
        columns.push(dataset.region_column.as_str());
    }
    columns.push(dataset.raw_value_column(derivation.source));

    let source = store.read(source_table, Some(&columns), &[])?;
    let derived = derive_series(derivation, &source, dataset)?;
    let target = dataset.derived_table(derivation.series);
    store.replace(target, &derived)?;
    info!(
        "Derived table '{}' from '{}' ({} rows)",
        target,
        source_table,
        derived.len()
    );
    Ok(derived.len())
}

#[derive(Debug)]
pub struct DerivationOutcome {
    pub series: DerivedSeries,
    pub result: Result<usize, PipelineError>,
}

/// Runs the five derivations against the store file at `db_path`.
pub struct AggregationEngine {
    db_path: PathBuf,
    dataset: Arc<DatasetConfig>,
}

impl AggregationEngine {
    pub fn new(db_path: impl Into<PathBuf>, dataset: Arc<DatasetConfig>) -> Self {
        Self {
            db_path: db_path.into(),
            dataset,
        }
    }

    fn open_store(&self) -> Result<SqliteTableStore, StoreError> {
        SqliteTableStore::open(
            &self.db_path,
            OpenMode::ExistingOnly,
            self.dataset.identifier_allow_list(),
        )
    }

    pub fn run(&self, derivation: &Derivation) -> Result<usize, PipelineError> {
        let store = self.open_store()?;
        run_derivation(&store, &self.dataset, derivation)
    }

    /// Runs every derivation in parallel, each on its own connection.
    ///
    /// Only an unavailable store fails the call; per-derivation failures are
    /// logged and reported in the returned outcomes.
    pub fn run_all(&self) -> Result<Vec<DerivationOutcome>, StoreError> {
        drop(self.open_store()?);

        let outcomes: Vec<DerivationOutcome> = Derivation::all()
            .into_par_iter()
            .map(|derivation| {
                let result = self.run(&derivation);
                if let Err(err) = &result {
                    error!(
                        "Derivation of '{}' failed: {}",
                        self.dataset.derived_table(derivation.series),
                        err
                    );
                }
                DerivationOutcome {
                    series: derivation.series,
                    result,
                }
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(
            "Derivations completed: {}/{} succeeded",
            succeeded,
            outcomes.len()
        );
        Ok(outcomes)
    }
}

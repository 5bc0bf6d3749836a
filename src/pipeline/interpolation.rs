use super::{round2, PipelineError};
use crate::config::{DatasetConfig, RawTable};
use crate::store::{Cell, TableData, TableStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Linearly fills the `None`s lying between two known values.
///
/// Steps are by position, not by year distance: the caller passes one
/// region's values already sorted by year. Leading and trailing gaps stay
/// empty, and a series with fewer than two known values is returned as is.
/// Filled values are rounded to 2 decimals, known values are untouched.
pub fn interpolate_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|value| (i, value)))
        .collect();
    if known.len() < 2 {
        return out;
    }

    for pair in known.windows(2) {
        let ((start, from), (end, to)) = (pair[0], pair[1]);
        let span = (end - start) as f64;
        for (offset, slot) in out[start + 1..end].iter_mut().enumerate() {
            let step = (offset + 1) as f64;
            *slot = Some(round2(from + (to - from) * step / span));
        }
    }
    out
}

/// A cell that was empty before interpolation and holds a synthetic value now.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledCell {
    pub region: String,
    pub year: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRows {
    pub data: TableData,
    pub filled: Vec<FilledCell>,
    /// Rows removed because their year could not be read as an integer.
    pub dropped: usize,
}

struct KeyedRow {
    year: i64,
    region: Option<String>,
    value: Option<f64>,
    cells: Vec<Cell>,
}

/// Coerces year and value, sorts by (region, year) and fills the interior
/// gaps of every region's series. Rows without a region are kept but never
/// interpolated. The column list is preserved.
pub fn normalize_rows(
    table: &str,
    data: &TableData,
    dataset: &DatasetConfig,
    value_column: &str,
) -> Result<NormalizedRows, PipelineError> {
    let index_of = |column: &str| {
        data.column_index(column)
            .ok_or_else(|| PipelineError::ConfigurationKeyMissing {
                table: table.to_string(),
                column: column.to_string(),
            })
    };
    let year_idx = index_of(&dataset.year_column)?;
    let region_idx = index_of(&dataset.region_column)?;
    let value_idx = index_of(value_column)?;

    let mut rows: Vec<KeyedRow> = Vec::with_capacity(data.len());
    let mut dropped = 0;
    for cells in &data.rows {
        let Some(year) = cells[year_idx].as_i64() else {
            dropped += 1;
            continue;
        };
        let mut cells = cells.clone();
        let value = cells[value_idx].as_f64();
        cells[year_idx] = Cell::Integer(year);
        cells[value_idx] = Cell::from_f64(value);
        rows.push(KeyedRow {
            year,
            region: cells[region_idx].to_text(),
            value,
            cells,
        });
    }

    rows.sort_by(|a, b| {
        (a.region.is_none(), &a.region, a.year).cmp(&(b.region.is_none(), &b.region, b.year))
    });

    let mut filled = Vec::new();
    let mut start = 0;
    while start < rows.len() {
        let end = start
            + rows[start..]
                .iter()
                .take_while(|r| r.region == rows[start].region)
                .count();

        if let Some(region) = rows[start].region.clone() {
            let series: Vec<Option<f64>> = rows[start..end].iter().map(|r| r.value).collect();
            let interpolated = interpolate_gaps(&series);
            for (row, (before, after)) in rows[start..end]
                .iter_mut()
                .zip(series.iter().zip(interpolated))
            {
                if let (None, Some(value)) = (before, after) {
                    row.cells[value_idx] = Cell::Real(value);
                    filled.push(FilledCell {
                        region: region.clone(),
                        year: row.year,
                        value,
                    });
                }
            }
        }
        start = end;
    }

    Ok(NormalizedRows {
        data: TableData {
            columns: data.columns.clone(),
            rows: rows.into_iter().map(|r| r.cells).collect(),
        },
        filled,
        dropped,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub table: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub filled: Vec<FilledCell>,
    /// True when the table was empty and therefore left alone.
    pub skipped_empty: bool,
}

#[derive(Debug, Default)]
pub struct NormalizationSummary {
    pub reports: Vec<NormalizationReport>,
    pub failures: Vec<(String, PipelineError)>,
}

impl NormalizationSummary {
    pub fn tables_processed(&self) -> usize {
        self.reports.iter().filter(|r| !r.skipped_empty).count()
    }

    pub fn cells_filled(&self) -> usize {
        self.reports.iter().map(|r| r.filled.len()).sum()
    }
}

/// Fills missing values of the raw tables in place.
pub struct InterpolationNormalizer {
    store: Arc<dyn TableStore>,
    dataset: Arc<DatasetConfig>,
}

impl InterpolationNormalizer {
    pub fn new(store: Arc<dyn TableStore>, dataset: Arc<DatasetConfig>) -> Self {
        Self { store, dataset }
    }

    pub fn normalize_table(
        &self,
        table: &str,
        value_column: &str,
    ) -> Result<NormalizationReport, PipelineError> {
        info!(
            "Starting interpolation for table '{}', column '{}'",
            table, value_column
        );
        let data = self.store.read(table, None, &[])?;
        if data.is_empty() {
            info!("Table '{}' is empty, skipping", table);
            return Ok(NormalizationReport {
                table: table.to_string(),
                rows_read: 0,
                rows_dropped: 0,
                filled: Vec::new(),
                skipped_empty: true,
            });
        }

        let normalized = normalize_rows(table, &data, &self.dataset, value_column)?;
        if normalized.dropped > 0 {
            warn!(
                "Table '{}': dropped {} rows with a non-numeric year",
                table, normalized.dropped
            );
        }
        for cell in &normalized.filled {
            info!(
                table = table,
                region = cell.region.as_str(),
                year = cell.year,
                value = cell.value,
                "Interpolated missing value"
            );
        }

        self.store.replace(table, &normalized.data)?;
        info!(
            "Table '{}' updated, {} missing values filled",
            table,
            normalized.filled.len()
        );

        Ok(NormalizationReport {
            table: table.to_string(),
            rows_read: data.len(),
            rows_dropped: normalized.dropped,
            filled: normalized.filled,
            skipped_empty: false,
        })
    }

    /// Normalizes the three raw tables. A table that fails is logged and
    /// skipped; the others are still processed.
    pub fn normalize_all(&self) -> NormalizationSummary {
        let mut summary = NormalizationSummary::default();
        for raw in RawTable::ALL {
            let table = self.dataset.raw_table(raw);
            match self.normalize_table(table, self.dataset.raw_value_column(raw)) {
                Ok(report) => summary.reports.push(report),
                Err(err) => {
                    error!("Interpolation of table '{}' failed, skipping: {}", table, err);
                    summary.failures.push((table.to_string(), err));
                }
            }
        }
        info!(
            "Interpolation completed: {} tables processed, {} values filled, {} failures",
            summary.tables_processed(),
            summary.cells_filled(),
            summary.failures.len()
        );
        summary
    }
}

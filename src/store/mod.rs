mod sqlite_table_store;
mod table_data;

pub use sqlite_table_store::{quote_identifier, OpenMode, SqliteTableStore};
pub use table_data::{Cell, Comparison, Condition, SqlType, TableData};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store file {0:?} is not available")]
    StoreUnavailable(PathBuf),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Column '{column}' does not exist in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("'{0}' is not a configured table or column name")]
    IdentifierNotAllowed(String),

    #[error("Malformed table data for '{table}': {reason}")]
    MalformedData { table: String, reason: String },

    #[error("Store I/O error: {0}")]
    StoreIO(#[from] rusqlite::Error),
}

/// Whole-table access to the relational store.
///
/// Reads return rows in table order. Writes always replace the whole table.
pub trait TableStore: Send + Sync {
    /// Reads `columns` (all columns when `None`) of the rows matching every
    /// condition in `predicate`.
    fn read(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        predicate: &[Condition],
    ) -> Result<TableData, StoreError>;

    /// Atomically drops `table` if present and recreates it with `data`.
    fn replace(&self, table: &str, data: &TableData) -> Result<(), StoreError>;

    /// Names of the tables currently in the store, sorted.
    fn table_names(&self) -> Result<Vec<String>, StoreError>;
}

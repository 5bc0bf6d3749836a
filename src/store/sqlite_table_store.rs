use super::{Cell, Condition, StoreError, TableData, TableStore};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OpenFlags};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Creates the file (and its parent directory) when missing.
    CreateIfMissing,
    /// Read-write, fails with `StoreUnavailable` when the file is missing.
    ExistingOnly,
    /// Read-only, fails with `StoreUnavailable` when the file is missing.
    ReadOnly,
}

/// Quotes a table or column name for inclusion in SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct SqliteTableStore {
    path: PathBuf,
    conn: Mutex<Connection>,
    allow_list: HashSet<String>,
}

impl SqliteTableStore {
    /// Opens the store in a single attempt; a missing file surfaces as
    /// `StoreUnavailable` instead of being checked beforehand.
    pub fn open<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        allow_list: HashSet<String>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let access = match mode {
            OpenMode::CreateIfMissing => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if let Err(err) = std::fs::create_dir_all(parent) {
                        warn!("Cannot create store directory {:?}: {}", parent, err);
                        return Err(StoreError::StoreUnavailable(path.to_path_buf()));
                    }
                }
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ExistingOnly => OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        };
        let flags = access | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;

        let conn = match Connection::open_with_flags(path, flags) {
            Ok(conn) => conn,
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::CannotOpen => {
                return Err(StoreError::StoreUnavailable(path.to_path_buf()))
            }
            Err(err) => return Err(err.into()),
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!("Opened store {:?} ({:?})", path, mode);

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            allow_list,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // The connection holds no state a panicking holder could leave half-updated.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_allowed(&self, identifier: &str) -> Result<(), StoreError> {
        if self.allow_list.contains(identifier) {
            Ok(())
        } else {
            Err(StoreError::IdentifierNotAllowed(identifier.to_string()))
        }
    }

    fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![table], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        if columns.is_empty() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}

impl TableStore for SqliteTableStore {
    fn read(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        predicate: &[Condition],
    ) -> Result<TableData, StoreError> {
        self.check_allowed(table)?;
        for column in columns.unwrap_or_default() {
            self.check_allowed(column)?;
        }
        for condition in predicate {
            self.check_allowed(&condition.column)?;
        }

        let conn = self.lock();
        let existing = Self::table_columns(&conn, table)?;
        let requested: Vec<&str> = columns.unwrap_or_default().to_vec();
        for column in requested
            .iter()
            .copied()
            .chain(predicate.iter().map(|c| c.column.as_str()))
        {
            if !existing.iter().any(|c| c == column) {
                return Err(StoreError::ColumnNotFound {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let selected: Vec<String> = match columns {
            Some(_) => requested.iter().map(|c| c.to_string()).collect(),
            None => existing,
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            selected
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            quote_identifier(table)
        );
        if !predicate.is_empty() {
            let terms: Vec<String> = predicate
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    format!(
                        "{} {} ?{}",
                        quote_identifier(&c.column),
                        c.comparison.as_sql(),
                        i + 1
                    )
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&terms.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");
        debug!("Executing query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let width = selected.len();
        let rows = stmt
            .query_map(params_from_iter(predicate.iter().map(|c| &c.value)), |row| {
                (0..width)
                    .map(|i| row.get::<_, Cell>(i))
                    .collect::<rusqlite::Result<Vec<Cell>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TableData {
            columns: selected,
            rows,
        })
    }

    fn replace(&self, table: &str, data: &TableData) -> Result<(), StoreError> {
        self.check_allowed(table)?;
        let malformed = |reason: String| StoreError::MalformedData {
            table: table.to_string(),
            reason,
        };
        if data.columns.is_empty() {
            return Err(malformed("no columns".to_string()));
        }
        let distinct: HashSet<&String> = data.columns.iter().collect();
        if distinct.len() != data.columns.len() {
            return Err(malformed("duplicate column names".to_string()));
        }
        if let Some(row) = data.rows.iter().find(|r| r.len() != data.columns.len()) {
            return Err(malformed(format!(
                "row has {} values, expected {}",
                row.len(),
                data.columns.len()
            )));
        }

        let column_defs: Vec<String> = data
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} {}", quote_identifier(name), data.column_type(i).as_sql()))
            .collect();
        let placeholders = vec!["?"; data.columns.len()].join(", ");
        let quoted_table = quote_identifier(table);

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quoted_table), [])?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", quoted_table, column_defs.join(", ")),
            [],
        )?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quoted_table, placeholders
            ))?;
            for row in &data.rows {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        info!("Replaced table '{}' with {} rows", table, data.len());
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

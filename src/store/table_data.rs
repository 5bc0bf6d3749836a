use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};

/// A single stored value, with the same storage classes SQLite uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Types a raw text field the way a dataframe loader would: empty is NULL,
    /// integer and float literals become numbers, anything else stays text.
    /// A decimal comma is accepted for floats.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Integer(value);
        }
        match parse_float(trimmed) {
            Some(value) => Cell::Real(value),
            None => Cell::Text(raw.to_string()),
        }
    }

    pub fn from_f64(value: Option<f64>) -> Cell {
        match value {
            Some(v) if v.is_finite() => Cell::Real(v),
            _ => Cell::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric coercion. Unparseable text and non-finite reals yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) if v.is_finite() => Some(*v),
            Cell::Real(_) => None,
            Cell::Text(s) => parse_float(s.trim()),
        }
    }

    /// Integer coercion. Reals and text are accepted only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            Cell::Text(s) => match s.trim().parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => parse_float(s.trim()).and_then(integral),
            },
            other => other.as_f64().and_then(integral),
        }
    }

    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(v) => Some(v.to_string()),
            Cell::Real(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Null => serde_json::Value::Null,
            Cell::Integer(v) => serde_json::Value::from(*v),
            Cell::Real(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

fn parse_float(s: &str) -> Option<f64> {
    let parsed = s
        .parse::<f64>()
        .ok()
        .or_else(|| s.replace(',', ".").parse::<f64>().ok())?;
    parsed.is_finite().then_some(parsed)
}

fn integral(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Cell::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for Cell {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(v) => Cell::Integer(v),
            ValueRef::Real(v) => Cell::Real(v),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Cell::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        })
    }
}

/// Declared SQL type of a column, inferred from its cells when a table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }

    /// Any text makes the column TEXT, any real makes it REAL.
    /// A column holding only NULLs is declared REAL.
    pub fn infer<'a>(cells: impl Iterator<Item = &'a Cell>) -> SqlType {
        let mut inferred: Option<SqlType> = None;
        for cell in cells {
            inferred = match (inferred, cell) {
                (_, Cell::Text(_)) => return SqlType::Text,
                (_, Cell::Null) => inferred,
                (Some(SqlType::Real), _) | (_, Cell::Real(_)) => Some(SqlType::Real),
                (_, Cell::Integer(_)) => Some(SqlType::Integer),
            };
        }
        inferred.unwrap_or(SqlType::Real)
    }
}

/// An ordered set of rows sharing one column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableData {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_type(&self, index: usize) -> SqlType {
        SqlType::infer(self.rows.iter().filter_map(|row| row.get(index)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Equal,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::AtLeast => ">=",
            Comparison::AtMost => "<=",
            Comparison::Equal => "=",
        }
    }
}

/// One term of a read predicate. Terms are combined with AND, and the value
/// is always bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub comparison: Comparison,
    pub value: Cell,
}

impl Condition {
    pub fn new(column: impl Into<String>, comparison: Comparison, value: Cell) -> Self {
        Self {
            column: column.into(),
            comparison,
            value,
        }
    }
}

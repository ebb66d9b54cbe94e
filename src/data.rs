//! Tabular data sources for filling templates.
//!
//! A data source is a header row plus records. Each record becomes a
//! [`DataRow`]: column name to [`CellValue`]. CSV cells are always text;
//! JSON sources (an array of flat objects) keep their scalar types.

use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// One scalar from a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// How a value reads once substituted into a paragraph.
///
/// Null is empty, booleans are `True`/`False`, whole floats drop their
/// fractional part (`3.0` reads `3`).
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", *x as i64),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(x: f64) -> Self {
        CellValue::Float(x)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Field name to value, for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow(BTreeMap<String, CellValue>);

impl DataRow {
    pub fn new() -> Self {
        DataRow::default()
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Option<CellValue> {
        self.0.insert(field.into(), value.into())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for DataRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        DataRow(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Anything that can hand out records for a batch fill.
pub trait RowSource {
    /// Column names in source order.
    fn columns(&self) -> &[String];
    fn rows(&self) -> &[DataRow];
}

/// An in-memory data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
}

impl RowSource for DataSet {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn rows(&self) -> &[DataRow] {
        &self.rows
    }
}

impl DataSet {
    /// Read a CSV with a header row. Header names are trimmed; every record
    /// must have as many fields as the header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows: Vec<DataRow> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(columns.iter().cloned().zip(record.iter()).collect());
        }

        tracing::debug!(columns = columns.len(), rows = rows.len(), "csv data source loaded");
        Ok(DataSet { columns, rows })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_csv_reader(file)
    }

    /// Read a JSON array of flat objects. Columns are the union of every
    /// object's keys, in first-seen order; a record missing a column simply
    /// lacks that field.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let records: Vec<IndexMap<String, serde_json::Value>> =
            serde_json::from_slice(bytes).map_err(|e| Error::MalformedRows(e.to_string()))?;

        let mut columns: IndexSet<String> = IndexSet::new();
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let mut row = DataRow::new();
            for (key, value) in record {
                let value = scalar(value).ok_or_else(|| {
                    Error::MalformedRows(format!("record {i}: field '{key}' is not a scalar"))
                })?;
                columns.insert(key.clone());
                row.insert(key, value);
            }
            rows.push(row);
        }

        Ok(DataSet { columns: columns.into_iter().collect(), rows })
    }

    /// Load by extension: `.csv` or `.json`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Self::from_csv_path(path),
            Some("json") => {
                let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
                Self::from_json_slice(&bytes)
            }
            _ => Err(Error::MalformedRows(format!("unsupported data source '{}'", path.display()))),
        }
    }
}

fn scalar(value: serde_json::Value) -> Option<CellValue> {
    use serde_json::Value;
    Some(match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => CellValue::Float(n.as_f64()?),
        },
        Value::String(s) => CellValue::Text(s),
        Value::Array(_) | Value::Object(_) => return None,
    })
}

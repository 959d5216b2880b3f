//! Parsed tabular records
//!
//! A [`Record`] is one data row of an uploaded sheet, keyed by the header row.
//! Field order follows the column order of the source file.

use serde::Serialize;
use serde::ser::SerializeMap;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric cell (CSV fields that parse as finite numbers, numeric workbook cells)
    Number(f64),
    /// Any other non-blank cell, kept verbatim
    Text(String),
    /// Boolean workbook cell
    Bool(bool),
    /// Blank cell
    Empty,
}

impl CellValue {
    /// Interpret a raw text field
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>()
            && n.is_finite()
        {
            return CellValue::Number(n);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One parsed row, an ordered mapping from column name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from header names and cells, padding missing cells with `Empty`
    pub fn from_row(headers: &[String], cells: Vec<CellValue>) -> Self {
        let mut cells = cells.into_iter();
        let fields = headers
            .iter()
            .map(|h| (h.clone(), cells.next().unwrap_or(CellValue::Empty)))
            .collect();
        Self { fields }
    }

    /// Append a field
    pub fn push(&mut self, key: impl Into<String>, value: CellValue) {
        self.fields.push((key.into(), value));
    }

    /// Look up a field by exact column name
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Column names in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every cell is blank
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

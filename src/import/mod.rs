//! Import functionality
//!
//! Parses uploaded sensor sheets into ordered [`Record`]s:
//! - CSV (comma-delimited, UTF-8)
//! - Excel workbooks (xlsx/xls), first sheet only
//!
//! In both cases the first row is the header row. Blank header cells are named
//! `__EMPTY`, `__EMPTY_1`, ... and repeated headers get a `_1`, `_2`, ... suffix.

pub mod delimited;
pub mod workbook;

use crate::models::Record;
use std::collections::HashMap;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Column names taken from the header row
    pub headers: Vec<String>,
    /// Data rows, blank rows skipped
    pub records: Vec<Record>,
}

impl ImportResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("{0}")]
    ParseError(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ParseError(err.to_string())
    }
}

/// Tabular formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Excel,
}

impl TabularFormat {
    /// Map a lower-case file extension to a format
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Container signatures of binary workbooks (OOXML zip, legacy OLE2)
const WORKBOOK_SIGNATURES: [&[u8]; 2] = [b"PK\x03\x04", b"\xD0\xCF\x11\xE0"];

/// Whether the content starts like a binary workbook
pub fn is_binary_workbook(bytes: &[u8]) -> bool {
    WORKBOOK_SIGNATURES.iter().any(|sig| bytes.starts_with(sig))
}

/// Importer for CSV and Excel sheets
#[derive(Debug, Default, Clone, Copy)]
pub struct TabularImporter;

impl TabularImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw file content according to its extension
    ///
    /// Spreadsheet extensions holding plain text (a CSV saved as `.xls`) are
    /// read as delimited text.
    pub fn import(&self, extension: &str, bytes: &[u8]) -> Result<ImportResult, ImportError> {
        match TabularFormat::from_extension(extension) {
            Some(TabularFormat::Csv) => delimited::parse_delimited(bytes),
            Some(TabularFormat::Excel) if is_binary_workbook(bytes) => {
                workbook::parse_workbook(bytes)
            }
            Some(TabularFormat::Excel) => {
                tracing::debug!(
                    extension,
                    "workbook extension without workbook signature, reading as CSV"
                );
                delimited::parse_delimited(bytes)
            }
            None => Err(ImportError::UnsupportedFormat(extension.to_string())),
        }
    }
}

/// Name header cells the way spreadsheet-to-JSON conversion does
///
/// A repeated name takes the next `_<n>` suffix not already used by an
/// earlier column.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .map(|header| {
            let base = if header.trim().is_empty() {
                "__EMPTY".to_string()
            } else {
                header
            };
            let mut counter = seen.get(&base).copied().unwrap_or(0);
            if counter == 0 {
                seen.insert(base.clone(), 1);
                return base;
            }
            let mut name = format!("{}_{}", base, counter);
            while seen.contains_key(&name) {
                counter += 1;
                name = format!("{}_{}", base, counter);
            }
            seen.insert(base, counter + 1);
            seen.insert(name.clone(), 1);
            name
        })
        .collect()
}

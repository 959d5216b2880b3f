//! Excel workbook parsing (xlsx/xls)

use super::{ImportError, ImportResult, normalize_headers};
use crate::models::{CellValue, Record};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

/// Parse the first sheet of a workbook, first row as header
pub fn parse_workbook(bytes: &[u8]) -> Result<ImportResult, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::ParseError(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ImportError::ParseError(e.to_string()))?,
        None => return Ok(ImportResult::default()),
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(row) => normalize_headers(row.iter().map(header_text).collect()),
        None => return Ok(ImportResult::default()),
    };

    let records = rows
        .map(|row| Record::from_row(&headers, row.iter().map(cell_value).collect()))
        .filter(|record| !record.is_blank())
        .collect();

    Ok(ImportResult { headers, records })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

//! CSV parsing

use super::{ImportError, ImportResult, normalize_headers};
use crate::models::{CellValue, Record};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse comma-delimited UTF-8 content, first row as header
pub fn parse_delimited(bytes: &[u8]) -> Result<ImportResult, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = reader.records();

    let headers = match rows.next() {
        Some(row) => normalize_headers(row?.iter().map(str::to_string).collect()),
        None => return Ok(ImportResult::default()),
    };

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let row = row.map_err(|e| {
            // index 0 is the second line of the file
            ImportError::ParseError(format!("line {}: {}", index + 2, e))
        })?;
        let record = Record::from_row(&headers, row.iter().map(CellValue::parse).collect());
        if !record.is_blank() {
            records.push(record);
        }
    }

    Ok(ImportResult { headers, records })
}

//! Output formatting for CLI

use crate::auth::UserProfile;
use crate::export::PdfExportResult;
use crate::models::Record;
use crate::validation::ValidationResult;

/// Format a validation outcome with a short preview of the parsed rows
pub fn format_validation(result: &ValidationResult, preview_rows: usize) -> String {
    let mut output = String::new();
    if !result.valid {
        output.push_str(&format!("✗ {}\n", result.message));
        return output;
    }

    output.push_str(&format!("✓ {}\n", result.message));
    if let Some(records) = &result.data {
        output.push_str(&format_records(records, preview_rows));
    }
    output
}

/// Tab-separated header plus the first `limit` rows
pub fn format_records(records: &[Record], limit: usize) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let mut output = String::new();
    let keys: Vec<&str> = first.keys().collect();
    output.push_str(&format!("\n  {}\n", keys.join("\t")));
    for record in records.iter().take(limit) {
        let cells: Vec<String> = record.iter().map(|(_, v)| v.to_string()).collect();
        output.push_str(&format!("  {}\n", cells.join("\t")));
    }
    if records.len() > limit {
        output.push_str(&format!("  ... {} more\n", records.len() - limit));
    }
    output
}

pub fn format_export(result: &PdfExportResult, location: &str) -> String {
    format!(
        "✓ {} ({} page{}) written to {}\n",
        result.title,
        result.page_count,
        if result.page_count == 1 { "" } else { "s" },
        location
    )
}

pub fn format_profile(profile: Option<&UserProfile>) -> String {
    match profile {
        Some(profile) => format!("Signed in as {} <{}>\n", profile.name, profile.email),
        None => "Not signed in\n".to_string(),
    }
}

//! Export functionality
//!
//! Captures chart regions and assembles them into PDF reports:
//! - `raster`: region capture and background flattening
//! - `chart`: built-in series and bar chart regions
//! - `pdf`: the document writer
//! - `report`: single and multi-chart report layouts

pub mod chart;
pub mod config;
pub mod pdf;
pub mod raster;
pub mod report;

use crate::storage::StorageError;

/// Error during export
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to capture chart region: {0}")]
    CaptureFailure(String),
    #[error("Failed to assemble document: {0}")]
    DocumentAssemblyFailure(String),
    #[error("No charts found to export")]
    NoRegions,
    #[error("Invalid export configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to save report: {0}")]
    Storage(#[from] StorageError),
}

impl ExportError {
    /// One-line message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::NoRegions => "No charts found to export",
            _ => "Failed to generate PDF report",
        }
    }
}

// Re-export for convenience
pub use chart::{Bar, BarChart, SeriesChart, period_regions};
pub use config::ExportConfig;
pub use pdf::{Orientation, PageSize, PdfDocument};
pub use raster::{Capture, ChartRegion, Rasterizer};
pub use report::{PdfExportResult, ReportExporter};

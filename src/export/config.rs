//! Configuration for report export

use serde::{Deserialize, Serialize};

use super::pdf::PageSize;

/// Configuration for [`ReportExporter`](super::ReportExporter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Pixel density multiple for captures
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Colour behind transparent capture pixels (`#rrggbb`)
    #[serde(default = "default_background")]
    pub background: String,
    /// File name for single-chart exports
    #[serde(default = "default_filename")]
    pub default_filename: String,
    /// File name for multi-chart exports
    #[serde(default = "default_multi_filename")]
    pub multi_filename: String,
    /// Title for single-chart exports
    #[serde(default = "default_title")]
    pub title: String,
    /// Title for multi-chart exports
    #[serde(default = "default_multi_title")]
    pub multi_title: String,
    #[serde(default)]
    pub page_size: PageSize,
}

fn default_scale() -> f32 {
    2.0
}

fn default_background() -> String {
    "#111111".to_string()
}

fn default_filename() -> String {
    "report.pdf".to_string()
}

fn default_multi_filename() -> String {
    "anomaly_report.pdf".to_string()
}

fn default_title() -> String {
    "Anomaly Detection Report".to_string()
}

fn default_multi_title() -> String {
    "Factory Anomaly Detection Report".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            background: default_background(),
            default_filename: default_filename(),
            multi_filename: default_multi_filename(),
            title: default_title(),
            multi_title: default_multi_title(),
            page_size: PageSize::default(),
        }
    }
}

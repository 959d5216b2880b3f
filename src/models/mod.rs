//! Models module for the SDK
//!
//! Defines the data structures flowing through ingestion and reporting.

pub mod record;
pub mod sensor;
pub mod upload;

pub use record::{CellValue, Record};
pub use sensor::{
    ReportPeriod, SensorReading, SensorType, generate_anomaly_series,
    generate_anomaly_series_until,
};
pub use upload::{FileContent, UploadedFile};

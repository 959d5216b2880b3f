//! Anomalyze SDK - sensor file ingestion and report export
//!
//! Provides:
//! - Validation of uploaded CSV/Excel sensor sheets
//! - A timer-driven upload/analysis stage machine
//! - Chart rasterization and PDF report export
//! - Session handling over pluggable storage backends

pub mod auth;
pub mod config;
pub mod export;
pub mod import;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod storage;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use storage::{MemoryStorageBackend, StorageBackend, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::FileSystemStorageBackend;

pub use config::{AnomalyzeConfig, ConfigError};
pub use export::{ChartRegion, ExportConfig, ExportError, PdfExportResult, ReportExporter};
pub use import::{ImportError, ImportResult, TabularImporter};
pub use ingest::{IngestConfig, IngestError, IngestionSnapshot, IngestionStage, IngestionStageMachine};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use validation::{FileValidator, ValidationConfig, ValidationError, ValidationResult};

// Re-export models
pub use models::{CellValue, Record, ReportPeriod, SensorType, UploadedFile};

// Re-export auth types
pub use auth::{Route, SessionError, SessionStore, SignUpRequest, UserProfile};

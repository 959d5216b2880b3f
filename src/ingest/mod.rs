//! Ingestion module
//!
//! Sequences a validated upload through the upload and analysis stages:
//! - `stage`: the stage enum and its allowed transitions
//! - `progress`: clamped counters and phase bucketing
//! - `config`: tick periods, steps and phase text
//! - `machine`: the task-driven stage machine

pub mod config;
pub mod machine;
pub mod progress;
pub mod stage;

pub use config::{DEFAULT_PHASES, IngestConfig, IngestConfigBuilder};
pub use machine::{IngestError, IngestionSnapshot, IngestionStageMachine};
pub use progress::{ProgressCounters, phase_index, phase_text};
pub use stage::IngestionStage;

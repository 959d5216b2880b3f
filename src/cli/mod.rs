//! CLI module for the anomalyze binary

pub mod commands;
pub mod error;
pub mod output;
pub mod progress;

pub use error::CliError;

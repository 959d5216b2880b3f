//! Configuration types for the ingestion progress ramps

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase descriptions shown while analysis progresses, in order
pub const DEFAULT_PHASES: [&str; 6] = [
    "Preprocessing data...",
    "Analyzing temperature patterns...",
    "Analyzing pressure readings...",
    "Detecting vibration anomalies...",
    "Correlating sensor data...",
    "Generating insights...",
];

/// Configuration for a simulated ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Upload percentage added per tick
    #[serde(default = "default_upload_step")]
    pub upload_step: u8,
    /// Milliseconds between upload ticks
    #[serde(default = "default_upload_period_ms")]
    pub upload_period_ms: u64,
    /// Analysis percentage added per tick
    #[serde(default = "default_analysis_step")]
    pub analysis_step: u8,
    /// Milliseconds between analysis ticks
    #[serde(default = "default_analysis_period_ms")]
    pub analysis_period_ms: u64,
    /// Phase descriptions, bucketed evenly over 0..=100
    #[serde(default = "default_phases")]
    pub phases: Vec<String>,
}

fn default_upload_step() -> u8 {
    10
}

fn default_upload_period_ms() -> u64 {
    300
}

fn default_analysis_step() -> u8 {
    5
}

fn default_analysis_period_ms() -> u64 {
    150
}

fn default_phases() -> Vec<String> {
    DEFAULT_PHASES.iter().map(|p| p.to_string()).collect()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_step: default_upload_step(),
            upload_period_ms: default_upload_period_ms(),
            analysis_step: default_analysis_step(),
            analysis_period_ms: default_analysis_period_ms(),
            phases: default_phases(),
        }
    }
}

impl IngestConfig {
    /// Create a new builder for IngestConfig
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    pub fn upload_period(&self) -> Duration {
        Duration::from_millis(self.upload_period_ms)
    }

    pub fn analysis_period(&self) -> Duration {
        Duration::from_millis(self.analysis_period_ms)
    }

    /// Check that the ramps terminate and phases can be shown
    pub fn validate(&self) -> Result<(), String> {
        for (name, step) in [
            ("upload_step", self.upload_step),
            ("analysis_step", self.analysis_step),
        ] {
            if step == 0 || step > 100 {
                return Err(format!("{} must be between 1 and 100, got {}", name, step));
            }
        }
        for (name, period) in [
            ("upload_period_ms", self.upload_period_ms),
            ("analysis_period_ms", self.analysis_period_ms),
        ] {
            if period == 0 {
                return Err(format!("{} must be greater than zero", name));
            }
        }
        if self.phases.is_empty() {
            return Err("at least one analysis phase is required".to_string());
        }
        Ok(())
    }
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    upload_step: Option<u8>,
    upload_period_ms: Option<u64>,
    analysis_step: Option<u8>,
    analysis_period_ms: Option<u64>,
    phases: Option<Vec<String>>,
}

impl IngestConfigBuilder {
    /// Set the upload increment per tick
    pub fn upload_step(mut self, step: u8) -> Self {
        self.upload_step = Some(step);
        self
    }

    /// Set the upload tick period
    pub fn upload_period(mut self, period: Duration) -> Self {
        self.upload_period_ms = Some(period.as_millis() as u64);
        self
    }

    /// Set the analysis increment per tick
    pub fn analysis_step(mut self, step: u8) -> Self {
        self.analysis_step = Some(step);
        self
    }

    /// Set the analysis tick period
    pub fn analysis_period(mut self, period: Duration) -> Self {
        self.analysis_period_ms = Some(period.as_millis() as u64);
        self
    }

    /// Replace the phase descriptions
    pub fn phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases = Some(phases.into_iter().map(Into::into).collect());
        self
    }

    /// Build the IngestConfig
    pub fn build(self) -> Result<IngestConfig, String> {
        let config = IngestConfig {
            upload_step: self.upload_step.unwrap_or_else(default_upload_step),
            upload_period_ms: self
                .upload_period_ms
                .unwrap_or_else(default_upload_period_ms),
            analysis_step: self.analysis_step.unwrap_or_else(default_analysis_step),
            analysis_period_ms: self
                .analysis_period_ms
                .unwrap_or_else(default_analysis_period_ms),
            phases: self.phases.unwrap_or_else(default_phases),
        };
        config.validate()?;
        Ok(config)
    }
}

//! Progress counters and phase text
//!
//! Counters are presentational: they advance by a fixed step per tick and
//! say nothing about real work done.

use serde::Serialize;

/// Upload and analysis percentages, each kept within 0..=100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounters {
    upload: u8,
    analysis: u8,
}

impl ProgressCounters {
    pub fn upload(&self) -> u8 {
        self.upload
    }

    pub fn analysis(&self) -> u8 {
        self.analysis
    }

    /// Add `step` to the upload counter and return the new value
    pub fn advance_upload(&mut self, step: u8) -> u8 {
        self.upload = clamp_add(self.upload, step);
        self.upload
    }

    /// Add `step` to the analysis counter and return the new value
    pub fn advance_analysis(&mut self, step: u8) -> u8 {
        self.analysis = clamp_add(self.analysis, step);
        self.analysis
    }

    pub fn reset_analysis(&mut self) {
        self.analysis = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn clamp_add(current: u8, step: u8) -> u8 {
    current.saturating_add(step).min(100)
}

/// Bucket a percentage into one of `phase_count` equal-width bins
///
/// Uses integer arithmetic so that bin edges are exact (50% of six phases is
/// bin 3, not 2). Returns `None` when there are no phases.
pub fn phase_index(progress: u8, phase_count: usize) -> Option<usize> {
    if phase_count == 0 {
        return None;
    }
    let progress = usize::from(progress.min(100));
    Some((progress * phase_count / 100).min(phase_count - 1))
}

/// Phase description for a percentage
pub fn phase_text(progress: u8, phases: &[String]) -> Option<&str> {
    phase_index(progress, phases.len()).map(|i| phases[i].as_str())
}

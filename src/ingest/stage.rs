//! Ingestion stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete phase of an ingestion run
///
/// Runs move strictly `Initial -> Uploading -> Analyzing -> Complete`, and only
/// an explicit reset returns `Complete -> Initial`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStage {
    #[default]
    Initial,
    Uploading,
    Analyzing,
    Complete,
}

impl IngestionStage {
    /// Get all stages in run order
    pub fn all() -> [Self; 4] {
        [Self::Initial, Self::Uploading, Self::Analyzing, Self::Complete]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::Complete => "complete",
        }
    }

    /// The only stage this one may move to
    pub fn next(&self) -> Self {
        match self {
            Self::Initial => Self::Uploading,
            Self::Uploading => Self::Analyzing,
            Self::Analyzing => Self::Complete,
            Self::Complete => Self::Initial,
        }
    }

    pub fn can_transition_to(&self, to: IngestionStage) -> bool {
        self.next() == to
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Uploading | Self::Analyzing)
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_a_single_cycle() {
        for stage in IngestionStage::all() {
            let allowed: Vec<_> = IngestionStage::all()
                .into_iter()
                .filter(|to| stage.can_transition_to(*to))
                .collect();
            assert_eq!(allowed, vec![stage.next()]);
        }
        assert!(!IngestionStage::Initial.can_transition_to(IngestionStage::Complete));
        assert!(!IngestionStage::Uploading.can_transition_to(IngestionStage::Complete));
        assert!(!IngestionStage::Analyzing.can_transition_to(IngestionStage::Initial));
    }

    #[test]
    fn test_running_stages() {
        assert!(!IngestionStage::Initial.is_running());
        assert!(IngestionStage::Uploading.is_running());
        assert!(IngestionStage::Analyzing.is_running());
        assert!(!IngestionStage::Complete.is_running());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&IngestionStage::Analyzing).unwrap(),
            "\"analyzing\""
        );
    }
}

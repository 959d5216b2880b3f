//! Progress bars for ingestion runs

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ingest::{IngestionSnapshot, IngestionStage};

const BAR_TEMPLATE: &str = "{prefix:>9} {bar:40.cyan/blue} {pos:>3}% {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ")
}

/// Upload and analysis bars driven by stage machine snapshots
pub struct IngestProgress {
    multi: MultiProgress,
    upload_bar: ProgressBar,
    analysis_bar: ProgressBar,
}

impl IngestProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let upload_bar = multi.add(ProgressBar::new(100));
        upload_bar.set_style(bar_style());
        upload_bar.set_prefix("Uploading");
        upload_bar.enable_steady_tick(Duration::from_millis(100));

        let analysis_bar = multi.add(ProgressBar::new(100));
        analysis_bar.set_style(bar_style());
        analysis_bar.set_prefix("Analyzing");

        Self {
            multi,
            upload_bar,
            analysis_bar,
        }
    }

    /// Reflect a snapshot on the bars
    pub fn update(&self, snapshot: &IngestionSnapshot) {
        self.upload_bar
            .set_position(u64::from(snapshot.upload_progress()));
        self.analysis_bar
            .set_position(u64::from(snapshot.analysis_progress()));
        if let Some(phase) = &snapshot.phase {
            self.analysis_bar.set_message(phase.clone());
        }
        match snapshot.stage {
            IngestionStage::Analyzing if !self.upload_bar.is_finished() => {
                self.upload_bar.finish_with_message("✓");
                self.analysis_bar
                    .enable_steady_tick(Duration::from_millis(100));
            }
            IngestionStage::Complete => {
                self.upload_bar.finish();
                self.analysis_bar.finish_with_message("✓");
            }
            _ => {}
        }
    }

    /// Print a line above the bars
    pub fn println(&self, message: &str) {
        let _ = self.multi.println(message);
    }

    pub fn abandon(&self, message: &str) {
        self.upload_bar.abandon();
        self.analysis_bar.abandon_with_message(format!("✗ {}", message));
    }
}

impl Default for IngestProgress {
    fn default() -> Self {
        Self::new()
    }
}

//! Ingest command implementation

use std::path::Path;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::cli::commands::validate::run_validation;
use crate::cli::error::CliError;
use crate::cli::progress::IngestProgress;
use crate::config::AnomalyzeConfig;
use crate::ingest::{IngestError, IngestionStageMachine};
use crate::notify::ChannelNotifier;
use crate::validation::FileValidator;

/// Validate a file, then run it through the upload and analysis stages
pub async fn handle_ingest(config: &AnomalyzeConfig, path: &Path) -> Result<(), CliError> {
    let validator = FileValidator::with_config(config.validation.clone());
    let result = run_validation(&validator, path).await?;
    println!("✓ {}", result.message);

    let (notifier, mut notifications) = ChannelNotifier::new();
    let machine = IngestionStageMachine::with_notifier(config.ingest.clone(), Arc::new(notifier))?;
    let mut updates = machine.subscribe();
    let (done_tx, mut done_rx) = oneshot::channel();

    let progress = IngestProgress::new();
    machine.start(result, move |records| {
        let _ = done_tx.send(records.len());
    })?;

    let record_count = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    progress.abandon("stage machine stopped");
                    return Err(IngestError::TaskFailed("state channel closed".to_string()).into());
                }
                let snapshot = updates.borrow_and_update().clone();
                progress.update(&snapshot);
            }
            Some(notification) = notifications.recv() => {
                progress.println(&notification.message);
            }
            count = &mut done_rx => {
                match count {
                    Ok(count) => break count,
                    Err(_) => {
                        progress.abandon("run ended early");
                        machine.join().await?;
                        return Err(IngestError::TaskFailed("run ended before completion".to_string()).into());
                    }
                }
            }
        }
    };

    progress.update(&machine.snapshot());
    while let Ok(notification) = notifications.try_recv() {
        progress.println(&notification.message);
    }
    println!("Ingested {} records", record_count);
    Ok(())
}

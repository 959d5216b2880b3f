//! Ingestion stage machine
//!
//! Drives a validated file through the simulated upload and analysis
//! ramps on a spawned task. Observers read [`IngestionSnapshot`]s from a
//! watch channel; the completion callback fires exactly once per run.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::config::IngestConfig;
use super::progress::{ProgressCounters, phase_text};
use super::stage::IngestionStage;
use crate::models::Record;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::validation::{ValidationError, ValidationResult};

/// Error raised by the stage machine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("An ingestion run is already in progress")]
    Busy,
    #[error("File was not validated: {0}")]
    NotValidated(String),
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        from: IngestionStage,
        to: IngestionStage,
    },
    #[error("Invalid ingest configuration: {0}")]
    InvalidConfig(String),
    #[error("Ingestion machine has been shut down")]
    ShutDown,
    #[error("Ingestion task failed: {0}")]
    TaskFailed(String),
}

/// Observable state of the machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSnapshot {
    pub stage: IngestionStage,
    pub progress: ProgressCounters,
    /// Phase description, present only while analyzing
    pub phase: Option<String>,
}

impl IngestionSnapshot {
    pub fn upload_progress(&self) -> u8 {
        self.progress.upload()
    }

    pub fn analysis_progress(&self) -> u8 {
        self.progress.analysis()
    }
}

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Runs {
    current: Option<RunHandle>,
    shut_down: bool,
}

/// Sequences `initial -> uploading -> analyzing -> complete`
pub struct IngestionStageMachine {
    config: Arc<IngestConfig>,
    state: Arc<watch::Sender<IngestionSnapshot>>,
    notifier: Arc<dyn Notifier>,
    runs: Mutex<Runs>,
}

impl IngestionStageMachine {
    /// Create a machine that reports through the tracing log
    pub fn new(config: IngestConfig) -> Result<Self, IngestError> {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(
        config: IngestConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::InvalidConfig)?;
        let (state, _) = watch::channel(IngestionSnapshot::default());
        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(state),
            notifier,
            runs: Mutex::new(Runs::default()),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Current state
    pub fn snapshot(&self) -> IngestionSnapshot {
        self.state.borrow().clone()
    }

    pub fn stage(&self) -> IngestionStage {
        self.state.borrow().stage
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<IngestionSnapshot> {
        self.state.subscribe()
    }

    /// Begin a run for a validated file
    ///
    /// Must be called from within a Tokio runtime. The callback receives
    /// the parsed records once analysis reaches 100%. An invalid result is
    /// rejected without touching state.
    pub fn start<F>(&self, validation: ValidationResult, on_complete: F) -> Result<(), IngestError>
    where
        F: FnOnce(Vec<Record>) + Send + 'static,
    {
        let mut runs = self.lock_runs()?;
        if runs.shut_down {
            return Err(IngestError::ShutDown);
        }

        // A finished run must be reset before the next one
        if !self.stage().can_transition_to(IngestionStage::Uploading) {
            return Err(IngestError::Busy);
        }
        if !validation.valid {
            return Err(IngestError::NotValidated(validation.message));
        }
        // A passing result must carry records
        let records = validation.into_data().ok_or_else(|| {
            IngestError::NotValidated(ValidationError::EmptyFile.to_string())
        })?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| IngestError::TaskFailed(e.to_string()))?;

        self.state.send_replace(IngestionSnapshot {
            stage: IngestionStage::Uploading,
            ..IngestionSnapshot::default()
        });
        self.notifier.notify(Notification::info("Starting file upload"));

        let run_id = Uuid::new_v4();
        let span = info_span!("ingestion_run", %run_id, records = records.len());
        let cancel = CancellationToken::new();
        let task = runtime.spawn(
            drive_run(
                Arc::clone(&self.config),
                Arc::clone(&self.state),
                Arc::clone(&self.notifier),
                cancel.clone(),
                records,
                on_complete,
            )
            .instrument(span),
        );

        runs.current = Some(RunHandle { cancel, task });
        Ok(())
    }

    /// Run to completion and return the records handed to the callback
    pub async fn run(&self, validation: ValidationResult) -> Result<Vec<Record>, IngestError> {
        let (tx, rx) = oneshot::channel();
        self.start(validation, move |records| {
            let _ = tx.send(records);
        })?;
        match rx.await {
            Ok(records) => Ok(records),
            Err(_) => {
                self.join().await?;
                Err(IngestError::TaskFailed(
                    "run ended before analysis completed".to_string(),
                ))
            }
        }
    }

    /// Return from `complete` to `initial`, clearing both counters
    pub fn reset(&self) -> Result<(), IngestError> {
        let mut runs = self.lock_runs()?;
        let current = self.stage();
        if current != IngestionStage::Complete {
            return Err(IngestError::InvalidTransition {
                from: current,
                to: IngestionStage::Initial,
            });
        }
        runs.current = None;
        self.state.send_replace(IngestionSnapshot::default());
        debug!("Ingestion machine reset");
        Ok(())
    }

    /// Resolve once the machine reaches `stage`
    pub async fn wait_for_stage(
        &self,
        stage: IngestionStage,
    ) -> Result<IngestionSnapshot, IngestError> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|s| s.stage == stage)
            .await
            .map_err(|e| IngestError::TaskFailed(e.to_string()))?;
        Ok(snapshot.clone())
    }

    /// Wait for the current run's task to exit
    pub async fn join(&self) -> Result<(), IngestError> {
        let handle = self.lock_runs()?.current.take();
        match handle {
            Some(handle) => handle
                .task
                .await
                .map_err(|e| IngestError::TaskFailed(e.to_string())),
            None => Ok(()),
        }
    }

    /// Stop any in-flight run and refuse further runs
    ///
    /// After this returns no state update or callback will happen.
    pub async fn shutdown(&self) -> Result<(), IngestError> {
        let handle = {
            let mut runs = self.lock_runs()?;
            runs.shut_down = true;
            runs.current.take()
        };
        if let Some(handle) = handle {
            handle.cancel.cancel();
            handle
                .task
                .await
                .map_err(|e| IngestError::TaskFailed(e.to_string()))?;
            info!(stage = %self.stage(), "Ingestion run cancelled");
        }
        Ok(())
    }

    fn lock_runs(&self) -> Result<std::sync::MutexGuard<'_, Runs>, IngestError> {
        self.runs
            .lock()
            .map_err(|_| IngestError::TaskFailed("run state lock poisoned".to_string()))
    }
}

impl Drop for IngestionStageMachine {
    fn drop(&mut self) {
        if let Ok(mut runs) = self.runs.lock()
            && let Some(handle) = runs.current.take()
        {
            handle.cancel.cancel();
        }
    }
}

async fn drive_run<F>(
    config: Arc<IngestConfig>,
    state: Arc<watch::Sender<IngestionSnapshot>>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
    records: Vec<Record>,
    on_complete: F,
) where
    F: FnOnce(Vec<Record>),
{
    info!("Upload started");
    let uploaded = ramp(config.upload_period(), &cancel, || {
        let mut reached = 0;
        state.send_modify(|s| {
            reached = s.progress.advance_upload(config.upload_step);
            if reached >= 100 {
                s.stage = IngestionStage::Analyzing;
                s.progress.reset_analysis();
                s.phase = phase_text(0, &config.phases).map(str::to_string);
            }
        });
        reached
    })
    .await;
    if !uploaded {
        warn!("Ingestion run cancelled during upload");
        return;
    }
    notifier.notify(Notification::success("Upload complete! Processing data..."));
    info!("Analysis started");

    let analyzed = ramp(config.analysis_period(), &cancel, || {
        let mut reached = 0;
        state.send_modify(|s| {
            reached = s.progress.advance_analysis(config.analysis_step);
            if reached >= 100 {
                s.stage = IngestionStage::Complete;
                s.phase = None;
            } else {
                s.phase = phase_text(reached, &config.phases).map(str::to_string);
            }
        });
        reached
    })
    .await;
    if !analyzed || cancel.is_cancelled() {
        warn!("Ingestion run cancelled during analysis");
        return;
    }

    notifier.notify(Notification::success("Analysis complete!"));
    info!(records = records.len(), "Ingestion run complete");
    on_complete(records);
}

/// Tick `advance` every `period` until it reports 100 or the run is cancelled
///
/// Returns false on cancellation.
async fn ramp(
    period: Duration,
    cancel: &CancellationToken,
    mut advance: impl FnMut() -> u8,
) -> bool {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = ticker.tick() => {
                if advance() >= 100 {
                    return true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use crate::notify::MemoryNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn records(n: usize) -> Vec<Record> {
        let headers = vec!["timestamp".to_string(), "sensor_id".to_string(), "value".to_string()];
        (0..n)
            .map(|i| {
                Record::from_row(
                    &headers,
                    vec![
                        CellValue::Text(format!("2024-01-0{}", i + 1)),
                        CellValue::Text("S1".to_string()),
                        CellValue::Number(i as f64),
                    ],
                )
            })
            .collect()
    }

    fn fast_config() -> IngestConfig {
        IngestConfig::builder()
            .upload_step(50)
            .upload_period(Duration::from_millis(10))
            .analysis_step(25)
            .analysis_period(Duration::from_millis(10))
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_completes_into_analysis() {
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        let mut rx = machine.subscribe();
        machine
            .start(ValidationResult::success(records(2)), |_| {})
            .unwrap();

        let snapshot = rx
            .wait_for(|s| s.upload_progress() == 100)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.stage, IngestionStage::Analyzing);
        assert_eq!(snapshot.analysis_progress(), 0);
        assert_eq!(snapshot.phase.as_deref(), Some("Preprocessing data..."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_result_leaves_state_untouched() {
        let notifier = Arc::new(MemoryNotifier::new());
        let machine =
            IngestionStageMachine::with_notifier(fast_config(), notifier.clone()).unwrap();
        let result = ValidationResult::failure(&ValidationError::EmptyFile);

        let err = machine.start(result, |_| {}).unwrap_err();
        assert_eq!(
            err,
            IngestError::NotValidated("The file appears to be empty".to_string())
        );
        assert_eq!(machine.snapshot(), IngestionSnapshot::default());
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_result_without_records_is_rejected() {
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        let empty = "The file appears to be empty".to_string();

        let forged = ValidationResult {
            valid: true,
            message: "Successfully loaded 0 records".to_string(),
            data: None,
        };
        assert_eq!(
            machine.start(forged, |_| {}).unwrap_err(),
            IngestError::NotValidated(empty.clone())
        );

        let hollow = ValidationResult {
            valid: true,
            message: "Successfully loaded 0 records".to_string(),
            data: Some(Vec::new()),
        };
        assert_eq!(
            machine.run(hollow).await.unwrap_err(),
            IngestError::NotValidated(empty)
        );
        assert_eq!(machine.stage(), IngestionStage::Initial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_busy() {
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        machine
            .start(ValidationResult::success(records(1)), |_| {})
            .unwrap();
        let err = machine
            .start(ValidationResult::success(records(1)), |_| {})
            .unwrap_err();
        assert_eq!(err, IngestError::Busy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        let counter = calls.clone();
        machine
            .start(ValidationResult::success(records(3)), move |records| {
                assert_eq!(records.len(), 3);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        machine.join().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(machine.stage(), IngestionStage::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_only_from_complete() {
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        assert_eq!(
            machine.reset().unwrap_err(),
            IngestError::InvalidTransition {
                from: IngestionStage::Initial,
                to: IngestionStage::Initial,
            }
        );

        let delivered = machine
            .run(ValidationResult::success(records(1)))
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(
            machine
                .start(ValidationResult::success(delivered.clone()), |_| {})
                .unwrap_err(),
            IngestError::Busy
        );

        machine.reset().unwrap();
        assert_eq!(machine.snapshot(), IngestionSnapshot::default());
        machine
            .start(ValidationResult::success(delivered), |_| {})
            .unwrap();
        assert_eq!(machine.stage(), IngestionStage::Uploading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_updates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let machine = IngestionStageMachine::new(fast_config()).unwrap();
        let counter = calls.clone();
        machine
            .start(ValidationResult::success(records(1)), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        machine.wait_for_stage(IngestionStage::Analyzing).await.unwrap();

        machine.shutdown().await.unwrap();
        let frozen = machine.snapshot();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(machine.snapshot(), frozen);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            machine
                .start(ValidationResult::success(records(1)), |_| {})
                .unwrap_err(),
            IngestError::ShutDown
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = IngestConfig {
            upload_step: 0,
            ..IngestConfig::default()
        };
        assert!(matches!(
            IngestionStageMachine::new(config),
            Err(IngestError::InvalidConfig(_))
        ));
    }
}

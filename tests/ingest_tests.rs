//! Ingestion stage machine tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anomalyze_sdk::ingest::{
    IngestConfig, IngestError, IngestionSnapshot, IngestionStage, IngestionStageMachine,
};
use anomalyze_sdk::models::UploadedFile;
use anomalyze_sdk::notify::MemoryNotifier;
use anomalyze_sdk::validation::{FileValidator, ValidationResult};

const SENSORS_CSV: &str = "\
timestamp,sensor_id,value,unit
2024-03-01T00:00:00Z,TEMP-01,71.2,C
2024-03-01T00:05:00Z,TEMP-01,72.8,C
2024-03-01T00:10:00Z,PRES-02,101.4,PSI
2024-03-01T00:15:00Z,VIB-03,3.2,mm/s
2024-03-01T00:20:00Z,SPD-04,1480,RPM
";

async fn validated() -> ValidationResult {
    let file = UploadedFile::from_bytes("sensors.csv", SENSORS_CSV.as_bytes().to_vec());
    FileValidator::new().validate(&file).await
}

/// Collect every distinct snapshot until the run completes
async fn record_run(machine: &IngestionStageMachine) -> Vec<IngestionSnapshot> {
    let mut rx = machine.subscribe();
    let mut seen = vec![rx.borrow_and_update().clone()];
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let done = snapshot.stage == IngestionStage::Complete;
        seen.push(snapshot);
        if done {
            break;
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_sensors_csv_end_to_end() {
    let notifier = Arc::new(MemoryNotifier::new());
    let machine =
        IngestionStageMachine::with_notifier(IngestConfig::default(), notifier.clone()).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    let result = validated().await;
    assert_eq!(result.message, "Successfully loaded 5 records");

    let sink = received.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    machine
        .start(result, move |records| {
            counter.fetch_add(1, Ordering::SeqCst);
            sink.lock().unwrap().extend(records);
        })
        .unwrap();

    let seen = record_run(&machine).await;
    machine.join().await.unwrap();

    let mut stages: Vec<IngestionStage> = seen.iter().map(|s| s.stage).collect();
    stages.dedup();
    assert_eq!(
        stages,
        vec![
            IngestionStage::Uploading,
            IngestionStage::Analyzing,
            IngestionStage::Complete
        ]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(received.lock().unwrap().len(), 5);
    assert_eq!(
        notifier.messages(),
        vec![
            "Starting file upload",
            "Upload complete! Processing data...",
            "Analysis complete!"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_upload_never_skips_analysis() {
    let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
    machine.start(validated().await, |_| {}).unwrap();

    for snapshot in record_run(&machine).await {
        if snapshot.upload_progress() == 100 && snapshot.stage != IngestionStage::Complete {
            assert_eq!(snapshot.stage, IngestionStage::Analyzing);
        }
        if snapshot.stage == IngestionStage::Uploading {
            assert_eq!(snapshot.analysis_progress(), 0);
            assert!(snapshot.phase.is_none());
        }
        if snapshot.stage == IngestionStage::Analyzing {
            assert!(snapshot.phase.is_some());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_bounded() {
    let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
    machine.start(validated().await, |_| {}).unwrap();

    let seen = record_run(&machine).await;
    for pair in seen.windows(2) {
        assert!(pair[1].upload_progress() >= pair[0].upload_progress());
        if pair[0].stage == pair[1].stage {
            assert!(pair[1].analysis_progress() >= pair[0].analysis_progress());
        }
    }
    assert!(seen.iter().all(|s| s.upload_progress() <= 100 && s.analysis_progress() <= 100));
    let last = seen.last().unwrap();
    assert_eq!((last.upload_progress(), last.analysis_progress()), (100, 100));
}

#[tokio::test(start_paused = true)]
async fn test_default_timing() {
    // 10 upload ticks of 300ms then 20 analysis ticks of 150ms
    let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
    let started = tokio::time::Instant::now();
    machine.start(validated().await, |_| {}).unwrap();

    machine
        .wait_for_stage(IngestionStage::Analyzing)
        .await
        .unwrap();
    let upload = started.elapsed();
    assert!(upload >= Duration::from_millis(3_000) && upload < Duration::from_millis(3_300));

    machine.wait_for_stage(IngestionStage::Complete).await.unwrap();
    let total = started.elapsed();
    assert!(total >= Duration::from_millis(6_000) && total < Duration::from_millis(6_150));
}

#[tokio::test(start_paused = true)]
async fn test_step_overshoot_is_clamped() {
    let config = IngestConfig::builder()
        .upload_step(30)
        .analysis_step(40)
        .build()
        .unwrap();
    let machine = IngestionStageMachine::new(config).unwrap();
    machine.start(validated().await, |_| {}).unwrap();

    let seen = record_run(&machine).await;
    let uploads: Vec<u8> = seen
        .iter()
        .filter(|s| s.stage == IngestionStage::Uploading)
        .map(|s| s.upload_progress())
        .collect();
    assert_eq!(uploads, vec![0, 30, 60, 90]);
    assert_eq!(seen.last().unwrap().analysis_progress(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_upload_never_starts() {
    let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
    let file = UploadedFile::from_bytes("sensors.txt", b"x".to_vec());
    let result = FileValidator::new().validate(&file).await;

    assert!(matches!(
        machine.start(result, |_| panic!("must not run")),
        Err(IngestError::NotValidated(_))
    ));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(machine.stage(), IngestionStage::Initial);
}

#[tokio::test(start_paused = true)]
async fn test_double_submission_is_rejected() {
    let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let counter = calls.clone();
        let _ = machine.start(validated().await, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    machine.wait_for_stage(IngestionStage::Complete).await.unwrap();
    machine.join().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    {
        let machine = IngestionStageMachine::new(IngestConfig::default()).unwrap();
        machine
            .start(validated().await, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

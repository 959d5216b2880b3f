//! Session tests against the file system backend

use std::sync::Arc;

use anomalyze_sdk::auth::{Route, SESSION_KEY, SessionError, SessionStore, SignUpRequest, UserProfile};
use anomalyze_sdk::storage::{FileSystemStorageBackend, StorageBackend};
use tempfile::TempDir;

fn signup(name: &str, email: &str) -> SignUpRequest {
    SignUpRequest {
        name: name.to_string(),
        email: email.to_string(),
        company: None,
        password: "correct horse".to_string(),
    }
}

#[tokio::test]
async fn test_session_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FileSystemStorageBackend::new(dir.path()));
    let store = SessionStore::new(backend.clone());

    assert_eq!(store.entry_route().await.unwrap(), Route::Landing);
    store
        .sign_up(signup("Grace", "grace@example.com"))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join(SESSION_KEY)).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        stored,
        serde_json::json!({"email": "grace@example.com", "name": "Grace"})
    );

    // a fresh store over the same directory sees the session
    let reopened = SessionStore::new(Arc::new(FileSystemStorageBackend::new(dir.path())));
    assert_eq!(
        reopened.load().await.unwrap(),
        Some(UserProfile::new("grace@example.com", "Grace"))
    );
    assert_eq!(reopened.entry_route().await.unwrap(), Route::Dashboard);

    reopened.logout().await.unwrap();
    assert!(!backend.file_exists(SESSION_KEY).await.unwrap());
    assert_eq!(store.entry_route().await.unwrap(), Route::Landing);
}

#[tokio::test]
async fn test_second_sign_up_replaces_profile() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(Arc::new(FileSystemStorageBackend::new(dir.path())));
    store.sign_up(signup("Grace", "grace@example.com")).await.unwrap();
    store.sign_up(signup("Ada", "ada@example.com")).await.unwrap();
    assert_eq!(
        store.load().await.unwrap().map(|p| p.name),
        Some("Ada".to_string())
    );
}

#[tokio::test]
async fn test_logout_without_session_is_ok() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(Arc::new(FileSystemStorageBackend::new(dir.path())));
    store.logout().await.unwrap();
}

#[tokio::test]
async fn test_invalid_sign_up_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(Arc::new(FileSystemStorageBackend::new(dir.path())));
    assert!(matches!(
        store.sign_up(signup("", "x@y.z")).await,
        Err(SessionError::MissingField("name"))
    ));
    assert!(!dir.path().join(SESSION_KEY).exists());
}

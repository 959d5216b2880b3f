//! Session types
//!
//! The signed-in user is an explicit [`SessionStore`] handed to whatever
//! needs it. Sign-up is a mock: credentials are accepted without checks and
//! the password is never stored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::storage::{StorageBackend, StorageError};

/// Storage key holding the serialized profile
pub const SESSION_KEY: &str = "user";

/// Signed-in user
///
/// # Example
///
/// ```rust
/// use anomalyze_sdk::auth::UserProfile;
///
/// let profile = UserProfile::new("ada@example.com", "Ada");
/// let json = serde_json::to_string(&profile).unwrap();
/// assert_eq!(json, r#"{"email":"ada@example.com","name":"Ada"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Sign-up form contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub password: String,
}

/// Where a visitor lands on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Landing,
    Dashboard,
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Loads, writes and clears the session profile
pub struct SessionStore {
    storage: Arc<dyn StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_notifier(storage, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(storage: Arc<dyn StorageBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    /// Record a new account and sign it in
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<UserProfile, SessionError> {
        let name = request.name.trim();
        let email = request.email.trim();
        if name.is_empty() {
            return Err(SessionError::MissingField("name"));
        }
        if email.is_empty() {
            return Err(SessionError::MissingField("email"));
        }

        let profile = UserProfile::new(email, name);
        let json = serde_json::to_vec(&profile)?;
        self.storage.write_file(SESSION_KEY, &json).await?;

        info!(
            email = %profile.email,
            company = request.company.as_deref().unwrap_or(""),
            "Account created"
        );
        self.notifier
            .notify(Notification::success("Account created successfully!"));
        Ok(profile)
    }

    /// Profile of the signed-in user, if any
    pub async fn load(&self) -> Result<Option<UserProfile>, SessionError> {
        if !self.storage.file_exists(SESSION_KEY).await? {
            return Ok(None);
        }
        let bytes = match self.storage.read_file(SESSION_KEY).await {
            Ok(bytes) => bytes,
            Err(StorageError::FileNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Dashboard when a profile exists, landing page otherwise
    pub async fn entry_route(&self) -> Result<Route, SessionError> {
        let route = match self.load().await? {
            Some(_) => Route::Dashboard,
            None => Route::Landing,
        };
        debug!(?route, "Resolved entry route");
        Ok(route)
    }

    /// Clear the stored profile
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.storage.delete_file(SESSION_KEY).await?;
        info!("Signed out");
        Ok(())
    }
}

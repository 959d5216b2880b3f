//! Session command implementation

use std::path::Path;
use std::sync::Arc;

use crate::auth::{SessionStore, SignUpRequest};
use crate::cli::error::CliError;
use crate::cli::output::format_profile;
use crate::storage::FileSystemStorageBackend;

fn store(session_dir: &Path) -> SessionStore {
    SessionStore::new(Arc::new(FileSystemStorageBackend::new(session_dir)))
}

pub async fn handle_signup(session_dir: &Path, request: SignUpRequest) -> Result<(), CliError> {
    let profile = store(session_dir).sign_up(request).await?;
    print!("{}", format_profile(Some(&profile)));
    Ok(())
}

/// Print the signed-in user; fails when nobody is signed in
pub async fn handle_show(session_dir: &Path) -> Result<(), CliError> {
    let profile = store(session_dir).load().await?;
    print!("{}", format_profile(profile.as_ref()));
    if profile.is_none() {
        return Err(CliError::NotSignedIn);
    }
    Ok(())
}

pub async fn handle_logout(session_dir: &Path) -> Result<(), CliError> {
    store(session_dir).logout().await?;
    println!("Signed out");
    Ok(())
}

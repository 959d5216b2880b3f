//! Command handlers

pub mod export;
pub mod ingest;
pub mod session;
pub mod validate;

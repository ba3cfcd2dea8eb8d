//! Error types for encore-sync
//!
//! Transport and transcode failures are recovered at file or entity
//! granularity and never surface here. [`SyncError`] is reserved for
//! conditions that abort a run.

use crate::services::FetchError;
use thiserror::Error;

/// Fatal run error
#[derive(Debug, Error)]
pub enum SyncError {
    /// Catalog listing could not be fetched
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] FetchError),

    /// Storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] encore_common::Error),

    /// Background task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(String),
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Storage(encore_common::Error::Io(err))
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Task(err.to_string())
    }
}

/// Result type for run-level operations
pub type SyncResult<T> = Result<T, SyncError>;

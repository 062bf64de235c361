//! Error types for staffsync-sync.

use thiserror::Error;

use staffsync_core::ValidationError;
use staffsync_sheets::GridError;
use staffsync_store::StoreError;

/// Failure to persist a sync log entry. Only ever logged by the engine.
#[derive(Debug, Error)]
#[error("could not write sync log entry: {source}")]
pub struct LoggingError {
    #[from]
    pub source: StoreError,
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or malformed caller input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The grid surface could not be read or written.
    #[error("grid access failed: {0}")]
    Grid(#[from] GridError),

    /// The record store could not be read or written.
    #[error("store access failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Logging(#[from] LoggingError),
}

impl SyncError {
    /// `true` when the caller, not a downstream system, is at fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

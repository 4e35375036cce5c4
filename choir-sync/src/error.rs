//! Error types for choir-sync.

use std::path::PathBuf;

use thiserror::Error;

use choir_core::ChoirError;

/// Errors surfaced to callers of the storage providers and caches.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The participant service failed or rejected a store/delete.
    #[error("participant service error: {0}")]
    Remote(#[from] ChoirError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (file cache).
    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

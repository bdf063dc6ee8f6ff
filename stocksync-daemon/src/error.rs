use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the loop runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },

    #[error("ctrl-c handler failed: {0}")]
    Signal(#[source] std::io::Error),

    #[error(transparent)]
    Sync(#[from] stocksync_sync::SyncError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

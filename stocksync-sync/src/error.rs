//! Error types for stocksync-sync.

use std::path::PathBuf;

use thiserror::Error;

use stocksync_feed::FeedError;
use stocksync_shop::ShopError;

/// Errors that abort a run. Per-variant update failures never end up here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Feed(#[from] FeedError),

    #[error("catalog fetch failed: {0}")]
    Catalog(#[source] ShopError),

    #[error("stock location unresolved: {0}")]
    Location(#[source] ShopError),

    /// Run log file I/O, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("run log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

//! Error types for stocksync-feed.

use thiserror::Error;

use stocksync_core::TransportError;

/// Failures that make the whole feed unusable.
///
/// Individual bad rows are not errors; see [`crate::SkipReason`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The transfer itself failed (connect, TLS, timeout).
    #[error("feed unavailable: {0}")]
    Unavailable(#[from] TransportError),

    /// The feed server answered with a non-success status.
    #[error("feed unavailable: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The payload has no header row.
    #[error("feed is empty (no header row)")]
    Empty,

    /// None of the accepted aliases for a required column is in the header.
    #[error("feed header has no {column} column (accepted: {accepted}; found: {found})")]
    MissingColumn {
        column: &'static str,
        accepted: String,
        found: String,
    },

    /// The header row could not be read.
    #[error("feed header unreadable: {0}")]
    Csv(#[from] csv::Error),
}

//! Error types for stocksync-shop.

use thiserror::Error;

use stocksync_core::TransportError;

/// Fatal storefront errors. Per-variant update failures are not errors; they
/// are reported as [`crate::UpdateResult::Failed`].
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("storefront request failed: {0}")]
    Transport(#[from] TransportError),

    /// Non-2xx response. `body` is already truncated for display.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("{endpoint} returned an unexpected payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storefront URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no stock location named '{name}' (available: {available})")]
    LocationNotFound { name: String, available: String },
}

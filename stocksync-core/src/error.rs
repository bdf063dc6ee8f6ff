//! Error types for stocksync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving a [`crate::SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was not provided by the config file or the environment.
    #[error("missing required configuration: {key}")]
    Missing { key: &'static str },

    /// A key was present but its value could not be interpreted.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A request never produced an HTTP response (DNS, connect, TLS, timeout, body read).
///
/// Non-2xx responses are *not* transport errors; they come back as
/// [`crate::HttpResponse`] so callers can decide how fatal they are.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Failed { url: String, message: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The body exceeded the in-memory cap; nothing of it is used.
    #[error("response body from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

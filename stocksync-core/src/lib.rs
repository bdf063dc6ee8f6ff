//! stocksync core library: domain types, configuration, reconciliation, and
//! the HTTP transport seam shared by the feed and storefront crates.
//!
//! Public API surface:
//! - [`types`]: newtypes and domain structs
//! - [`config`]: layered [`SyncConfig`] (YAML file + environment)
//! - [`reconcile`]: feed/catalog diff into [`SyncDecision`]s
//! - [`transport`]: [`Transport`] trait and the `ureq` implementation
//! - [`error`]: [`ConfigError`], [`TransportError`]

pub mod config;
pub mod error;
pub mod reconcile;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub mod types;

pub use config::{
    CatalogConfig, FeedConfig, FeedDelimiter, FeedFailurePolicy, LocationTarget, ShopConfig,
    SyncConfig, TagMatch, UpdateConfig, UpdatePolicy, sync_interval_from_minutes,
    MAX_SYNC_INTERVAL_MINUTES,
};
pub use error::{ConfigError, TransportError};
pub use reconcile::{reconcile, Tally};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
pub use types::{
    CatalogVariant, InventoryItemId, LocationId, ProductId, Quantity, RunLogEntry, Sku,
    StockFeedEntry, StockFeedMap, SyncAction, SyncDecision, UpdateOutcome,
};

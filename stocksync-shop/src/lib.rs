//! # stocksync-shop
//!
//! Storefront (Shopify Admin REST) client for the stock sync:
//!
//! - [`catalog`]: tagged products via [`pagination::ProductPages`], flattened
//!   into [`stocksync_core::CatalogVariant`]s
//! - [`location`]: target stock location, resolved once per run
//! - [`inventory`]: connect + set calls for a single variant
//!
//! Every call goes through a borrowed [`stocksync_core::Transport`].

pub mod catalog;
pub mod client;
pub mod error;
pub mod inventory;
pub mod location;
pub mod pagination;

pub use catalog::fetch_tagged_variants;
pub use client::{truncate_detail, ShopClient, DETAIL_LIMIT};
pub use error::ShopError;
pub use inventory::{InventoryUpdater, UpdateResult};
pub use location::{list_locations, resolve_location, Location};
pub use pagination::{parse_next_link, ProductPages};

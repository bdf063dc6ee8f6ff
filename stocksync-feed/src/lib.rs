//! # stocksync-feed
//!
//! Supplier stock feed: download ([`fetch_feed`]) and parse
//! ([`parse_feed`]) a comma- or semicolon-delimited export into a
//! [`stocksync_core::StockFeedMap`].
//!
//! Rows that cannot be used never fail the parse; they are reported as
//! [`RowSkip`]s alongside the map.

pub mod error;
pub mod fetch;
pub mod parser;

pub use error::FeedError;
pub use fetch::fetch_feed;
pub use parser::{
    detect_delimiter, parse_feed, parse_quantity, FeedParse, RowSkip, SkipReason,
    QUANTITY_COLUMNS, SKU_COLUMNS,
};

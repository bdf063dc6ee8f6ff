//! Feed download.

use stocksync_core::{FeedConfig, HttpRequest, Transport};

use crate::error::FeedError;
use crate::parser::{parse_feed, FeedParse};

/// Download the feed at `config.url` and parse it.
///
/// Transfer failures, timeouts and non-2xx statuses are [`FeedError`]s; what
/// the run does with them is the caller's policy.
pub fn fetch_feed(transport: &dyn Transport, config: &FeedConfig) -> Result<FeedParse, FeedError> {
    tracing::info!(url = %config.url, "downloading stock feed");

    let request = HttpRequest::get(&config.url).timeout(config.timeout);
    let response = transport.send(&request)?;
    if !response.is_success() {
        return Err(FeedError::Status {
            url: config.url.clone(),
            status: response.status,
        });
    }

    let feed = parse_feed(&response.body, config.delimiter)?;
    if !feed.skipped.is_empty() {
        tracing::warn!(
            skipped = feed.skipped.len(),
            rows = feed.rows,
            "some feed rows were dropped"
        );
    }
    tracing::info!(skus = feed.map.len(), rows = feed.rows, "stock feed loaded");
    Ok(feed)
}

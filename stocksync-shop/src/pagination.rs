//! Cursor pagination over the products endpoint.
//!
//! The platform returns the next page as a `Link` header entry with
//! `rel="next"`; the last page has none. [`ProductPages`] walks that chain
//! lazily, one request per `next()`.

use std::collections::HashSet;

use crate::catalog::{Product, ProductsPage};
use crate::client::{decode, ShopClient};
use crate::error::ShopError;

/// Extract the `rel="next"` target from a `Link` header value.
///
/// ```text
/// <https://shop/admin/api/2024-07/products.json?page_info=abc&limit=250>; rel="next", <…>; rel="previous"
/// ```
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let entry = entry.trim();
        let rest = entry.strip_prefix('<')?;
        let (target, params) = rest.split_once('>')?;
        let is_next = params.split(';').any(|param| {
            let Some((key, value)) = param.trim().split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });
        (is_next && !target.trim().is_empty()).then(|| target.trim().to_string())
    })
}

/// Lazy, finite page sequence starting at a first-page URL.
///
/// Ends after the page without a next link, after the first error, or when a
/// next link repeats one already visited. Create a new one to start over.
pub struct ProductPages<'a> {
    client: ShopClient<'a>,
    next_url: Option<String>,
    visited: HashSet<String>,
    requests: usize,
}

impl<'a> ProductPages<'a> {
    pub fn new(client: ShopClient<'a>, first_url: impl Into<String>) -> Self {
        Self {
            client,
            next_url: Some(first_url.into()),
            visited: HashSet::new(),
            requests: 0,
        }
    }

    /// Requests issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl Iterator for ProductPages<'_> {
    type Item = Result<Vec<Product>, ShopError>;

    fn next(&mut self) -> Option<Self::Item> {
        let url = self.next_url.take()?;
        self.visited.insert(url.clone());
        self.requests += 1;

        let response = match self.client.get(&url) {
            Ok(response) => response,
            Err(err) => return Some(Err(err)),
        };
        let page: ProductsPage = match decode("products.json", &response) {
            Ok(page) => page,
            Err(err) => return Some(Err(err)),
        };

        self.next_url = match response.header("link").and_then(parse_next_link) {
            Some(next) if self.visited.contains(&next) => {
                tracing::warn!(url = %next, "pagination cursor repeated; stopping");
                None
            }
            other => other,
        };

        tracing::debug!(
            page = self.requests,
            products = page.products.len(),
            more = self.next_url.is_some(),
            "fetched catalog page"
        );
        Some(Ok(page.products))
    }
}

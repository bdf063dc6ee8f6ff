//! Authenticated access to the Admin REST API.

use serde::de::DeserializeOwned;
use stocksync_core::{HttpRequest, HttpResponse, ShopConfig, Transport};
use url::Url;

use crate::error::ShopError;

/// Response bodies are cut to this many characters in logs and errors.
pub const DETAIL_LIMIT: usize = 200;

const TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Thin request helper over a borrowed transport; holds no state of its own.
#[derive(Clone, Copy)]
pub struct ShopClient<'a> {
    transport: &'a dyn Transport,
    config: &'a ShopConfig,
}

impl<'a> ShopClient<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a ShopConfig) -> Self {
        Self { transport, config }
    }

    /// `{admin_url}/{resource}` as a parsed URL, e.g. `resource = "products.json"`.
    pub fn endpoint(&self, resource: &str) -> Result<Url, ShopError> {
        let raw = format!("{}/{}", self.config.admin_url(), resource);
        Url::parse(&raw).map_err(|source| ShopError::InvalidUrl { url: raw, source })
    }

    /// GET `url` with credentials. Non-2xx is returned, not raised.
    pub fn get(&self, url: &str) -> Result<HttpResponse, ShopError> {
        let request = self.authorize(HttpRequest::get(url));
        Ok(self.transport.send(&request)?)
    }

    /// POST a JSON body with credentials. Non-2xx is returned, not raised.
    pub fn post_json(&self, url: &str, body: serde_json::Value) -> Result<HttpResponse, ShopError> {
        let request = self.authorize(HttpRequest::post_json(url, body));
        Ok(self.transport.send(&request)?)
    }

    /// GET and decode a 2xx JSON body; anything else is a [`ShopError`].
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        endpoint: &'static str,
    ) -> Result<(T, HttpResponse), ShopError> {
        let response = self.get(url)?;
        let value = decode(endpoint, &response)?;
        Ok((value, response))
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        request
            .header(TOKEN_HEADER, &self.config.access_token)
            .header("Accept", "application/json")
    }
}

/// Require a 2xx status, then decode the body.
pub(crate) fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: &HttpResponse,
) -> Result<T, ShopError> {
    if !response.is_success() {
        return Err(ShopError::Status {
            endpoint,
            status: response.status,
            body: truncate_detail(&response.body),
        });
    }
    serde_json::from_str(&response.body).map_err(|source| ShopError::Decode { endpoint, source })
}

/// First [`DETAIL_LIMIT`] characters of `body`, trimmed, with `…` when cut.
pub fn truncate_detail(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(DETAIL_LIMIT) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

//! HTTP seam between the sync logic and the network.
//!
//! Both the feed download and every storefront call go through
//! [`Transport::send`]. Production uses [`UreqTransport`]; tests use the
//! scripted transport from [`crate::testing`].

use std::io::Read;
use std::time::Duration;

use crate::error::TransportError;

/// Default per-request timeout when a request does not carry its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a response body read into memory (64 MiB).
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            json: None,
            timeout: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            json: Some(body),
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup; first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Blocking request/response exchange.
///
/// Implementations return non-2xx responses as `Ok`; `Err` means no response
/// was received at all.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// [`Transport`] backed by a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("stocksync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = match request.method {
            Method::Get => self.agent.get(&request.url),
            Method::Post => self.agent.post(&request.url),
        };
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let result = match &request.json {
            Some(body) => req.send_json(body),
            None => req.call(),
        };

        let response = match result {
            Ok(response) => response,
            // ureq reports 4xx/5xx as errors; they are still responses here.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(transport_error(&request.url, &transport));
            }
        };

        into_http_response(&request.url, response)
    }
}

fn transport_error(url: &str, transport: &ureq::Transport) -> TransportError {
    let is_timeout = transport
        .to_string()
        .to_ascii_lowercase()
        .contains("timed out");
    if is_timeout {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Failed {
            url: url.to_string(),
            message: transport.to_string(),
        }
    }
}

fn into_http_response(url: &str, response: ureq::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status();
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();

    let bytes = read_body(url, response.into_reader(), MAX_BODY_BYTES)?;

    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Read at most `limit` bytes. A body with more than that is an error, never
/// a silently shortened payload.
fn read_body(url: &str, reader: impl Read, limit: u64) -> Result<Vec<u8>, TransportError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })?;
    if bytes.len() as u64 > limit {
        return Err(TransportError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn body_at_limit_is_read_whole() {
        let body = b"sku;stock\nLAST;12345\n";
        let bytes = read_body("https://feed", Cursor::new(body), body.len() as u64).unwrap();
        assert_eq!(bytes, body);
    }

    #[test]
    fn body_over_limit_is_rejected_not_truncated() {
        let body = b"sku;stock\nLAST;12345\n";
        let err = read_body("https://feed", Cursor::new(body), body.len() as u64 - 3).unwrap_err();
        assert!(
            matches!(err, TransportError::TooLarge { limit, .. } if limit == body.len() as u64 - 3),
            "got: {err}"
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "").with_header("Link", "<https://x>; rel=\"next\"");
        assert_eq!(response.header("link"), Some("<https://x>; rel=\"next\""));
        assert_eq!(response.header("LINK"), Some("<https://x>; rel=\"next\""));
        assert!(response.header("content-type").is_none());
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(422, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn request_builder_collects_headers() {
        let req = HttpRequest::get("https://example.com")
            .header("X-Shopify-Access-Token", "t")
            .timeout(Duration::from_secs(5));
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.timeout, Some(Duration::from_secs(5)));
    }
}

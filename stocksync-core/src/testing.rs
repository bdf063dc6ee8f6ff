//! In-memory [`Transport`] for tests.
//!
//! Routes are matched on method + exact URL. Each route holds a queue of
//! replies; the last reply is sticky so a route can serve any number of
//! identical calls. Unrouted requests get a 404 so a test fails loudly
//! instead of hanging on the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

type Reply = Result<HttpResponse, String>;

struct Route {
    method: Method,
    url: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method url`.
    pub fn on(&self, method: Method, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.push(method, url.into(), Ok(response))
    }

    /// Queue a transport failure for `method url`.
    pub fn fail(&self, method: Method, url: impl Into<String>, message: impl Into<String>) -> &Self {
        self.push(method, url.into(), Err(message.into()))
    }

    fn push(&self, method: Method, url: String, reply: Reply) -> &Self {
        let mut routes = self.routes.lock().expect("routes lock");
        match routes.iter_mut().find(|r| r.method == method && r.url == url) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                url,
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Requests whose URL contains `fragment`.
    pub fn calls_to(&self, fragment: &str) -> Vec<HttpRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.url.contains(fragment))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().expect("calls lock").push(request.clone());

        let mut routes = self.routes.lock().expect("routes lock");
        let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.url == request.url)
        else {
            return Ok(HttpResponse::new(
                404,
                format!("no scripted route for {:?} {}", request.method, request.url),
            ));
        };

        let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        };

        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Failed {
                url: request.url.clone(),
                message,
            }),
            None => Ok(HttpResponse::new(404, "route exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_reply_is_sticky() {
        let t = ScriptedTransport::new();
        t.on(Method::Get, "https://a", HttpResponse::new(500, "first"))
            .on(Method::Get, "https://a", HttpResponse::new(200, "rest"));

        let req = HttpRequest::get("https://a");
        assert_eq!(t.send(&req).unwrap().status, 500);
        assert_eq!(t.send(&req).unwrap().status, 200);
        assert_eq!(t.send(&req).unwrap().status, 200);
        assert_eq!(t.calls().len(), 3);
    }

    #[test]
    fn unrouted_request_is_404() {
        let t = ScriptedTransport::new();
        let resp = t.send(&HttpRequest::get("https://nowhere")).unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn scripted_failure_is_transport_error() {
        let t = ScriptedTransport::new();
        t.fail(Method::Get, "https://down", "connection refused");
        let err = t.send(&HttpRequest::get("https://down")).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}

#![warn(missing_docs)]
use crate::error::Error;
use crate::req::HttpRequest;
use crate::res::responder::Responder;
use crate::res::HttpResponse;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Reserved parameter key under which `*` and `**` captures are stored.
pub const WILDCARD_PARAM: &str = "_";

/// Represents the HTTP methods supported for routing and request handling.
///
/// [`ANY`](Method::ANY) is the wildcard method: routes registered under it
/// match every inbound method, at lower precedence than exact-method routes.
#[derive(Eq, Hash, PartialEq, Clone, Debug)]
#[allow(missing_docs)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
    CONNECT,
    /// The wildcard method, written `*`. Matches any HTTP method on lookup.
    ANY,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
            Method::ANY => "*",
        };
        write!(f, "{}", method)
    }
}

impl From<&hyper::Method> for Method {
    fn from(method: &hyper::Method) -> Self {
        match *method {
            hyper::Method::GET => Method::GET,
            hyper::Method::POST => Method::POST,
            hyper::Method::PUT => Method::PUT,
            hyper::Method::DELETE => Method::DELETE,
            hyper::Method::PATCH => Method::PATCH,
            hyper::Method::HEAD => Method::HEAD,
            hyper::Method::OPTIONS => Method::OPTIONS,
            hyper::Method::TRACE => Method::TRACE,
            hyper::Method::CONNECT => Method::CONNECT,
            _ => Method::GET,
        }
    }
}

/// A boxed responder, as returned through the middleware chain.
pub type BoxResponder = Box<dyn Responder + Send + 'static>;

/// The boxed future a route handler produces.
pub type Fut = Pin<Box<dyn Future<Output = Result<Reply, Error>> + Send + 'static>>;

/// A registered route handler.
pub type Handler = Arc<dyn Fn(RequestEvent) -> Fut + Send + Sync + 'static>;

pub(crate) fn box_future<F>(future: F) -> Fut
where
    F: Future<Output = Result<Reply, Error>> + Send + 'static,
{
    Box::pin(future)
}

/// The per-request context handed to middleware and handlers.
///
/// Owns the inbound [`HttpRequest`], the mutable [`HttpResponse`] being
/// accumulated (status defaults to 200), and the path parameters extracted by
/// the route match. Consumed by [`send`](RequestEvent::send) to produce the
/// handler's [`Reply`].
pub struct RequestEvent {
    /// The inbound request.
    pub req: HttpRequest,
    /// The response under construction. Middleware may set status, headers
    /// and cookies here before or after running `next`.
    pub res: HttpResponse,
    pub(crate) params: HashMap<String, String>,
}

impl RequestEvent {
    /// Builds a fresh event for a request: status 200, no headers, no params.
    pub fn new(req: HttpRequest) -> Self {
        Self {
            req,
            res: HttpResponse::new(),
            params: HashMap::new(),
        }
    }

    /// Returns a path parameter extracted by the route match.
    ///
    /// ## Example
    /// ```
    /// use viaduct::context::RequestEvent;
    /// use viaduct::req::HttpRequest;
    /// use viaduct::types::Method;
    ///
    /// let event = RequestEvent::new(HttpRequest::new(Method::GET, "/users/42"));
    /// assert!(event.param("id").is_none());
    /// ```
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|value| value.as_str())
    }

    /// Returns the `*`/`**` capture, stored under the reserved key `_`.
    pub fn wildcard(&self) -> Option<&str> {
        self.param(WILDCARD_PARAM)
    }

    /// All extracted path parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Finishes the event with the given responder.
    pub fn send<R>(self, responder: R) -> Reply
    where
        R: Responder + Send + 'static,
    {
        Reply {
            event: self,
            responder: Box::new(responder),
        }
    }
}

/// A finished request: the event plus the responder that will materialise the
/// response body.
pub struct Reply {
    pub(crate) event: RequestEvent,
    pub(crate) responder: BoxResponder,
}

impl Reply {
    /// The event carried by this reply.
    pub fn event(&self) -> &RequestEvent {
        &self.event
    }

    /// Mutable access to the event, for middleware post-processing.
    pub fn event_mut(&mut self) -> &mut RequestEvent {
        &mut self.event
    }
}

//! Request descriptors and per-request context.
//!
//! This module contains the types the dispatcher works on:
//! - `Request`: the descriptor handed over by the transport (protocol kind, method, path, query)
//! - `RequestContext`: the request plus the state attached to it for one dispatch
//! - `PathParams`: the raw path captures of a matched route

use crate::router::Router;
use bytes::Bytes;
use http::Method;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// The protocol kind the transport declared for a request.
///
/// Only `Http` and `WebSocket` requests are routed, anything else is rejected up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Http,
    WebSocket,
    Other(String),
}

impl RequestKind {
    #[inline]
    pub fn is_routable(&self) -> bool {
        matches!(self, RequestKind::Http | RequestKind::WebSocket)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestKind::Http => "http",
            RequestKind::WebSocket => "websocket",
            RequestKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-formed request descriptor as delivered by the transport layer.
#[derive(Debug, Clone)]
pub struct Request {
    kind: RequestKind,
    method: Method,
    path: String,
    query_string: Bytes,
}

impl Request {
    /// Creates an `http` request with an empty query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { kind: RequestKind::Http, method, path: path.into(), query_string: Bytes::new() }
    }

    /// Creates an `http` request from a path that may carry a `?query` suffix.
    pub fn from_uri(method: Method, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => Self::new(method, path).with_query(Bytes::copy_from_slice(query.as_bytes())),
            None => Self::new(method, uri),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query_string: impl Into<Bytes>) -> Self {
        self.query_string = query_string.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw, still percent-encoded query string, without the leading `?`.
    pub fn query_string(&self) -> &[u8] {
        &self.query_string
    }
}

impl From<&http::request::Parts> for Request {
    fn from(parts: &http::request::Parts) -> Self {
        let query = parts.uri.query().map(|q| Bytes::copy_from_slice(q.as_bytes())).unwrap_or_default();
        Request::new(parts.method.clone(), parts.uri.path()).with_query(query)
    }
}

/// The state of one dispatch: the request, a back-reference to the router serving it and the
/// request-scoped cancellation signal.
///
/// The router reference is weak: a request never keeps a routing table alive, and nothing
/// reachable from here can mutate it.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    router: Weak<Router>,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub(crate) fn new(request: Request, router: Weak<Router>, cancellation: CancellationToken) -> Self {
        Self { request, router, cancellation }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// The router that dispatched this request, if it is still alive.
    pub fn router(&self) -> Option<Arc<Router>> {
        self.router.upgrade()
    }

    /// Cancelled when the request times out or its dispatch is abandoned.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Raw path parameters captured from the request path, in template declaration order.
///
/// Path parameters are named segments of the route template. For example, in the template
/// "/users/{id}", "id" is a path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(Arc<str>, String)>,
}

impl PathParams {
    #[inline]
    pub(crate) fn new(values: Vec<(Arc<str>, String)>) -> Self {
        Self { values }
    }

    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Gets the raw value of a path parameter by its name
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.values.iter().find(|(name, _)| name.as_ref() == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_ref(), value.as_str()))
    }

    pub(crate) fn entries(&self) -> &[(Arc<str>, String)] {
        &self.values
    }
}

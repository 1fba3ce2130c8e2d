//! The route table.
//!
//! A [`Router`] keeps its routes in registration order. Lookup scans them in that order and the
//! first route matching both method and path wins; routes whose path matches under another method
//! are remembered so that the miss can be reported as 405 instead of 404.
//!
//! Registration order is the only precedence rule: `/users/me` registered after `/users/{id}`
//! is never reached for GET requests, since `{id}` captures `me` as well.
//!
//! # Example
//! ```
//! use arc_router::router::{get, post, Lookup, Router};
//! use arc_router::handler_fn;
//! use http::Method;
//!
//! async fn hello() -> &'static str {
//!     "Hello, World"
//! }
//!
//! let router = Router::builder()
//!     .route("/", get(handler_fn(hello)))
//!     .route("/greetings", post(handler_fn(hello)))
//!     .build()
//!     .unwrap();
//!
//! assert!(matches!(router.lookup(&Method::GET, "/"), Lookup::Found { .. }));
//! assert!(matches!(router.lookup(&Method::GET, "/greetings"), Lookup::MethodNotAllowed { .. }));
//! assert!(matches!(router.lookup(&Method::GET, "/unknown"), Lookup::NotFound));
//! ```

mod error;
mod route;

pub use error::RegistrationError;
pub use route::{parse_method, Route, METHODS};

use crate::handler::Handler;
use crate::pattern::MatchOutcome;
use crate::PathParams;
use http::Method;
use std::collections::HashSet;
use tracing::info;

/// Registered routes, in registration order.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    keys: HashSet<(Method, String)>,
}

/// The outcome of looking a request up in a [`Router`].
#[derive(Debug)]
pub enum Lookup<'r> {
    /// The first route matching both method and path.
    Found { route: &'r Route, params: PathParams },

    /// The path exists, but not under the requested method.
    MethodNotAllowed { allowed: Vec<Method> },

    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Creates a router from already built routes, registering them in order.
    pub fn with_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, RegistrationError> {
        let mut router = Self::new();
        for route in routes {
            router.insert(route)?;
        }
        Ok(router)
    }

    /// Registers `handler` for `method` requests on `path`.
    ///
    /// # Errors
    /// - `InvalidMethod` if `method` is not one of [`METHODS`]
    /// - `InvalidHandler` if the handler's signature can't be dispatched to
    /// - `InvalidTemplate` if `path` repeats a placeholder name
    /// - `RouteConflict` if `(method, path)` is already registered
    pub fn register(&mut self, path: impl Into<String>, handler: Handler, method: &str) -> Result<(), RegistrationError> {
        self.insert(Route::new(path, handler, method)?)
    }

    /// Appends an already built route.
    pub fn insert(&mut self, route: Route) -> Result<(), RegistrationError> {
        let key = (route.method().clone(), route.path().to_owned());
        if self.keys.contains(&key) {
            let (method, path) = key;
            return Err(RegistrationError::RouteConflict { method, path });
        }

        info!(method = %route.method(), path = route.path(), blocking = route.kind().is_blocking(), "register route");
        self.keys.insert(key);
        self.routes.push(route);
        Ok(())
    }

    /// Registers every route of `other` under `prefix`, keeping their order.
    ///
    /// Routes are checked one by one: when one of them fails, the routes before it stay
    /// registered.
    pub fn mount(&mut self, prefix: &str, other: Router) -> Result<(), RegistrationError> {
        for route in other.routes {
            self.insert(route.prefixed(prefix)?)?;
        }
        Ok(())
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            match route.match_request(method, path) {
                MatchOutcome::Matched(params) => return Lookup::Found { route, params },
                MatchOutcome::PathOnly => {
                    if !allowed.contains(route.method()) {
                        allowed.push(route.method().clone());
                    }
                }
                MatchOutcome::NoMatch => {}
            }
        }

        if allowed.is_empty() { Lookup::NotFound } else { Lookup::MethodNotAllowed { allowed } }
    }

    /// The methods registered for templates matching `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.matcher().captures(path).is_some() && !allowed.contains(route.method()) {
                allowed.push(route.method().clone());
            }
        }
        allowed
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Collects routes and registers them, in order, on [`build`](RouterBuilder::build).
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<(String, MethodRoute)>,
    mounts: Vec<(String, RouterBuilder)>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: impl Into<String>, method_route: MethodRoute) -> Self {
        self.routes.push((path.into(), method_route));
        self
    }

    /// Mounts the routes of `other` under `prefix`, after this builder's own routes.
    pub fn mount(mut self, prefix: impl Into<String>, other: RouterBuilder) -> Self {
        self.mounts.push((prefix.into(), other));
        self
    }

    pub fn build(self) -> Result<Router, RegistrationError> {
        let mut router = Router::new();
        for (path, MethodRoute { method, handler }) in self.routes {
            router.insert(Route::with_method(path, handler, method)?)?;
        }
        for (prefix, other) in self.mounts {
            router.mount(&prefix, other.build()?)?;
        }
        Ok(router)
    }
}

/// A handler bound to a method, waiting for its path.
#[derive(Debug)]
pub struct MethodRoute {
    method: Method,
    handler: Handler,
}

impl MethodRoute {
    pub fn new(method: Method, handler: Handler) -> Self {
        Self { method, handler }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        pub fn $name(handler: Handler) -> MethodRoute {
            MethodRoute::new(Method::$method, handler)
        }
    };
}

method_route!(get, GET);
method_route!(post, POST);
method_route!(put, PUT);
method_route!(delete, DELETE);
method_route!(head, HEAD);
method_route!(options, OPTIONS);
method_route!(connect, CONNECT);
method_route!(patch, PATCH);
method_route!(trace, TRACE);

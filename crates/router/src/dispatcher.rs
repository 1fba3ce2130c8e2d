//! Request dispatch.
//!
//! The [`Dispatcher`] owns the route table and turns every [`Request`] into exactly one outcome:
//! a routing [`Rejection`] rendered as a response, the response of the matched handler, or the
//! handler's error returned as a [`DispatchError`].
//!
//! Non-blocking handlers are awaited in place. Blocking handlers run on tokio's blocking pool,
//! behind a semaphore bounding how many of them run at once.

use crate::body::ResponseBody;
use crate::handler::{BlockingRequestHandler, HandlerError, HandlerKind};
use crate::params::{coerce, Arguments, QueryParams};
use crate::rejection::Rejection;
use crate::router::{Lookup, Router};
use crate::{Request, RequestContext};
use arc_swap::ArcSwap;
use http::Response;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_MAX_BLOCKING_HANDLERS: usize = 64;

/// Errors that are not turned into responses.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),

    #[error("blocking handler did not complete: {0}")]
    Join(#[from] JoinError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("router must be set")]
    MissingRouter,

    #[error("max_blocking_handlers must be between 1 and {max}, got {value}")]
    InvalidBlockingLimit { value: usize, max: usize },
}

/// Dispatcher settings that can be loaded from any serde source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Upper bound of blocking handlers running at the same time.
    pub max_blocking_handlers: usize,

    /// Cancels the request-scoped token after this many milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { max_blocking_handlers: DEFAULT_MAX_BLOCKING_HANDLERS, request_timeout_ms: None }
    }
}

#[derive(Debug)]
pub struct DispatcherBuilder {
    router: Option<Router>,
    max_blocking_handlers: usize,
    request_timeout: Option<Duration>,
}

impl DispatcherBuilder {
    fn new() -> Self {
        Self { router: None, max_blocking_handlers: DEFAULT_MAX_BLOCKING_HANDLERS, request_timeout: None }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn max_blocking_handlers(mut self, max_blocking_handlers: usize) -> Self {
        self.max_blocking_handlers = max_blocking_handlers;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    /// Applies every setting of `config`.
    pub fn config(mut self, config: &DispatcherConfig) -> Self {
        self.max_blocking_handlers = config.max_blocking_handlers;
        self.request_timeout = config.request_timeout_ms.map(Duration::from_millis);
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let router = self.router.ok_or(BuildError::MissingRouter)?;

        if self.max_blocking_handlers == 0 || self.max_blocking_handlers > Semaphore::MAX_PERMITS {
            return Err(BuildError::InvalidBlockingLimit {
                value: self.max_blocking_handlers,
                max: Semaphore::MAX_PERMITS,
            });
        }

        Ok(Dispatcher {
            router: ArcSwap::from_pointee(router),
            blocking_permits: Arc::new(Semaphore::new(self.max_blocking_handlers)),
            request_timeout: self.request_timeout,
        })
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    router: ArcSwap<Router>,
    blocking_permits: Arc<Semaphore>,
    request_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Creates a dispatcher with default settings.
    pub fn new(router: Router) -> Self {
        Self {
            router: ArcSwap::from_pointee(router),
            blocking_permits: Arc::new(Semaphore::new(DEFAULT_MAX_BLOCKING_HANDLERS)),
            request_timeout: None,
        }
    }

    /// The route table currently serving requests.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Replaces the whole route table. Requests already dispatched keep using the old one.
    pub fn reload(&self, router: Router) {
        info!(routes = router.len(), "reload route table");
        self.router.store(Arc::new(router));
    }

    pub async fn dispatch(&self, request: Request) -> Result<Response<ResponseBody>, DispatchError> {
        self.dispatch_with_cancellation(request, CancellationToken::new()).await
    }

    /// Dispatches `request`, handing handlers a token that is cancelled when `cancellation` is.
    ///
    /// The token handlers see is also cancelled when the request times out, or when the returned
    /// future is dropped before completion.
    pub async fn dispatch_with_cancellation(
        &self,
        request: Request,
        cancellation: CancellationToken,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        let token = cancellation.child_token();
        let guard = token.clone().drop_guard();
        let _timer = self.request_timeout.map(|timeout| CancelAfter::spawn(token.clone(), timeout));

        let result = self.route(request, token).await;

        guard.disarm();
        result
    }

    async fn route(&self, request: Request, token: CancellationToken) -> Result<Response<ResponseBody>, DispatchError> {
        if !request.kind().is_routable() {
            return Ok(reject(&request, Rejection::UnsupportedKind(request.kind().clone())));
        }

        let router = self.router.load_full();
        let (route, params) = match router.lookup(request.method(), request.path()) {
            Lookup::Found { route, params } => (route, params),
            Lookup::MethodNotAllowed { allowed } => {
                let rejection = Rejection::MethodNotAllowed {
                    method: request.method().clone(),
                    path: request.path().to_owned(),
                    allowed,
                };
                return Ok(reject(&request, rejection));
            }
            Lookup::NotFound => {
                let rejection = Rejection::NotFound { path: request.path().to_owned() };
                return Ok(reject(&request, rejection));
            }
        };

        let query = match QueryParams::parse(request.query_string()) {
            Ok(query) => query,
            Err(e) => return Ok(reject(&request, e.into())),
        };

        let args = match coerce(route.signature(), &params, &query) {
            Ok(args) => args,
            Err(e) => return Ok(reject(&request, e.into())),
        };

        debug!(method = %request.method(), path = request.path(), route = route.path(), "dispatch request");
        let ctx = RequestContext::new(request, Arc::downgrade(&router), token);

        let result = match route.kind() {
            HandlerKind::NonBlocking(handler) => handler.invoke(&ctx, args).await.map_err(DispatchError::Handler),
            HandlerKind::Blocking(handler) => self.invoke_blocking(handler.as_ref(), &ctx, args).await,
        };

        if let Err(e) = &result {
            warn!(method = %ctx.method(), path = ctx.path(), cause = %e, "handler failed");
        }
        result
    }

    async fn invoke_blocking(
        &self,
        handler: &dyn BlockingRequestHandler,
        ctx: &RequestContext,
        args: Arguments,
    ) -> Result<Response<ResponseBody>, DispatchError> {
        let call = handler.prepare(ctx, args).map_err(DispatchError::Handler)?;
        // the semaphore is never closed, so acquiring only waits
        let permit = Arc::clone(&self.blocking_permits)
            .acquire_owned()
            .await
            .map_err(|e| DispatchError::Handler(Box::new(e)))?;

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            call()
        })
        .await?;

        result.map_err(DispatchError::Handler)
    }
}

fn reject(request: &Request, rejection: Rejection) -> Response<ResponseBody> {
    debug!(
        method = %request.method(),
        path = request.path(),
        status = rejection.status_code().as_u16(),
        reason = %rejection.message(),
        "reject request"
    );
    rejection.into_response()
}

/// Cancels a token once a timeout elapses, unless dropped first.
struct CancelAfter {
    handle: JoinHandle<()>,
}

impl CancelAfter {
    fn spawn(token: CancellationToken, timeout: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            debug!(?timeout, "request timed out");
            token.cancel();
        });
        Self { handle }
    }
}

impl Drop for CancelAfter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Path, Query};
    use crate::handler::{Handler, HandlerResult, RequestHandler};
    use crate::params::{ParamType, Value};
    use crate::responder::Responder;
    use crate::router::{get, post};
    use crate::{blocking_fn, handler_fn, RequestKind};
    use async_trait::async_trait;
    use http::header::{ALLOW, CONTENT_TYPE};
    use http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn hello() -> &'static str {
        "Hello, World"
    }

    async fn foo(Path(bar): Path<i64>) -> String {
        bar.to_string()
    }

    #[derive(Deserialize)]
    struct FooParams {
        bar: Option<i64>,
    }

    async fn foo_query(Query(params): Query<FooParams>) -> String {
        match params.bar {
            Some(bar) => bar.to_string(),
            None => "None".to_owned(),
        }
    }

    async fn search(Query(params): Query<Value>) -> String {
        params["q"].as_str().unwrap_or_default().to_owned()
    }

    async fn fails() -> Result<String, std::io::Error> {
        Err(std::io::Error::other("database unavailable"))
    }

    fn dispatcher() -> Dispatcher {
        let router = Router::builder()
            .route("/", get(handler_fn(hello)))
            .route("/foo/{bar}", get(handler_fn(foo).param("bar", ParamType::Integer)))
            .route("/foo", get(handler_fn(foo_query).optional("bar", ParamType::Integer, Value::Null)))
            .route("/search", get(handler_fn(search).param("q", ParamType::String)))
            .route("/fails", post(handler_fn(fails)))
            .build()
            .unwrap();

        Dispatcher::new(router)
    }

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn error_message(response: Response<ResponseBody>) -> String {
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        let envelope: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        envelope["Error"].as_str().unwrap().to_owned()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_hello_world() {
        let response = dispatcher().dispatch(Request::new(Method::GET, "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Hello, World");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_typed_path_parameter() {
        let response = dispatcher().dispatch(Request::new(Method::GET, "/foo/10")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "10");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_query_parameter_default() {
        let dispatcher = dispatcher();

        let response = dispatcher.dispatch(Request::from_uri(Method::GET, "/foo?bar=10")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "10");

        let response = dispatcher.dispatch(Request::new(Method::GET, "/foo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "None");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_query_coercion_failure() {
        let response = dispatcher().dispatch(Request::from_uri(Method::GET, "/foo?bar=abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("bar"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_path_coercion_failure() {
        let router = Router::builder()
            .route("/foo/{bar}", get(handler_fn(foo).param("bar", ParamType::Integer)))
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let response = dispatcher.dispatch(Request::new(Method::GET, "/foo/abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let message = error_message(response).await;
        assert!(message.starts_with("Bad request, "));
        assert!(message.contains("bar"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_method_not_allowed() {
        let response = dispatcher().dispatch(Request::new(Method::POST, "/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET");
        assert_eq!(error_message(response).await, "Method not allowed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_not_found() {
        let response = dispatcher().dispatch(Request::new(Method::GET, "/unknown")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(error_message(response).await.contains("/unknown"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_missing_parameter() {
        let dispatcher = dispatcher();

        let response = dispatcher.dispatch(Request::new(Method::GET, "/search")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_message(response).await, "Missing required query parameter q");

        let response = dispatcher.dispatch(Request::from_uri(Method::GET, "/search?q=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = dispatcher.dispatch(Request::from_uri(Method::GET, "/search?q=rust")).await.unwrap();
        assert_eq!(body_string(response).await, "rust");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_malformed_query_is_bad_request() {
        let dispatcher = dispatcher();

        let response = dispatcher.dispatch(Request::from_uri(Method::GET, "/foo?bar=%zz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.starts_with("Bad request, failed to parse query string: "));

        let request = Request::new(Method::GET, "/foo").with_query(&b"bar=%FF%FE"[..]);
        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_unsupported_kind() {
        let request = Request::new(Method::GET, "/").with_kind(RequestKind::Other("lifespan".into()));
        let response = dispatcher().dispatch(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("lifespan"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_websocket_is_routed() {
        let request = Request::new(Method::GET, "/").with_kind(RequestKind::WebSocket);
        let response = dispatcher().dispatch(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_handler_error_propagates() {
        let err = dispatcher().dispatch(Request::new(Method::POST, "/fails")).await.unwrap_err();

        assert!(matches!(&err, DispatchError::Handler(e) if e.to_string() == "database unavailable"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_extractor_failure_is_handler_error() {
        let router = Router::builder().route("/foo/{bar}", get(handler_fn(foo))).build().unwrap();
        let err = Dispatcher::new(router).dispatch(Request::new(Method::GET, "/foo/abc")).await.unwrap_err();

        assert!(matches!(err, DispatchError::Handler(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_blocking_handler() {
        let router = Router::builder()
            .route("/double/{n}", get(blocking_fn(|Path(n): Path<i64>| (n * 2).to_string()).param("n", ParamType::Integer)))
            .build()
            .unwrap();

        let response = Dispatcher::new(router).dispatch(Request::new(Method::GET, "/double/21")).await.unwrap();
        assert_eq!(body_string(response).await, "42");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_blocking_handlers_are_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handler = {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            blocking_fn(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(30));
                active.fetch_sub(1, Ordering::SeqCst);
                "done"
            })
        };

        let router = Router::builder().route("/slow", get(handler)).build().unwrap();
        let dispatcher = Dispatcher::builder().router(router).max_blocking_handlers(1).build().unwrap();

        let (a, b, c) = tokio::join!(
            dispatcher.dispatch(Request::new(Method::GET, "/slow")),
            dispatcher.dispatch(Request::new(Method::GET, "/slow")),
            dispatcher.dispatch(Request::new(Method::GET, "/slow")),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_blocking_handler_panic() {
        let router = Router::builder()
            .route("/panic", get(blocking_fn(|| -> String { panic!("handler panicked") })))
            .build()
            .unwrap();

        let err = Dispatcher::new(router).dispatch(Request::new(Method::GET, "/panic")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Join(e) if e.is_panic()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_reload() {
        let dispatcher = dispatcher();
        let before = dispatcher.router();

        let router = Router::builder().route("/v2", get(handler_fn(hello))).build().unwrap();
        dispatcher.reload(router);

        let response = dispatcher.dispatch(Request::new(Method::GET, "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatcher.dispatch(Request::new(Method::GET, "/v2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(before.len(), 5);
        assert_eq!(dispatcher.router().len(), 1);
    }

    struct RouteCount;

    #[async_trait]
    impl RequestHandler for RouteCount {
        async fn invoke(&self, req: &RequestContext, _args: Arguments) -> HandlerResult {
            req.router().map_or(0, |router| router.len()).to_string().respond()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_router_back_reference() {
        let router = Router::builder()
            .route("/", get(handler_fn(hello)))
            .route("/routes", get(Handler::non_blocking(RouteCount)))
            .build()
            .unwrap();

        let response = Dispatcher::new(router).dispatch(Request::new(Method::GET, "/routes")).await.unwrap();
        assert_eq!(body_string(response).await, "2");
    }

    async fn wait_for_cancellation(token: CancellationToken) -> &'static str {
        token.cancelled().await;
        "cancelled"
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_request_timeout_cancels_token() {
        let router = Router::builder().route("/wait", get(handler_fn(wait_for_cancellation))).build().unwrap();
        let dispatcher =
            Dispatcher::builder().router(router).request_timeout(Duration::from_millis(20)).build().unwrap();

        let response = dispatcher.dispatch(Request::new(Method::GET, "/wait")).await.unwrap();
        assert_eq!(body_string(response).await, "cancelled");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_caller_cancellation() {
        let router = Router::builder().route("/wait", get(handler_fn(wait_for_cancellation))).build().unwrap();
        let dispatcher = Dispatcher::new(router);

        let cancellation = CancellationToken::new();
        let canceller = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let response =
            dispatcher.dispatch_with_cancellation(Request::new(Method::GET, "/wait"), cancellation).await.unwrap();
        assert_eq!(body_string(response).await, "cancelled");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_dropped_dispatch_cancels_token() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<CancellationToken>();
        let handler = handler_fn(move |token: CancellationToken| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(token);
                std::future::pending::<()>().await
            }
        });

        let router = Router::builder().route("/hang", get(handler)).build().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(router));

        let task = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(Request::new(Method::GET, "/hang")).await })
        };

        let token = rx.recv().await.unwrap();
        assert!(!token.is_cancelled());

        task.abort();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled()).await.unwrap();
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(Dispatcher::builder().build().err(), Some(BuildError::MissingRouter));

        let err = Dispatcher::builder().router(Router::new()).max_blocking_handlers(0).build().err();
        assert!(matches!(err, Some(BuildError::InvalidBlockingLimit { value: 0, .. })));
    }

    #[test]
    fn test_config_from_json() {
        let config: DispatcherConfig = serde_json::from_value(json!({ "request_timeout_ms": 250 })).unwrap();

        assert_eq!(config.max_blocking_handlers, 64);
        assert_eq!(config.request_timeout_ms, Some(250));

        let dispatcher = Dispatcher::builder().router(Router::new()).config(&config).build().unwrap();
        assert_eq!(dispatcher.request_timeout, Some(Duration::from_millis(250)));
    }
}

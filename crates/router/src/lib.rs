//! A request routing and dispatch engine.
//!
//! Handlers are registered on a [`Router`] under a method and a path template such as
//! `/users/{id}`, together with the types of their parameters. A [`Dispatcher`] then takes
//! transport-neutral [`Request`]s, finds the route, coerces path and query parameters and invokes
//! the handler:
//!
//! ```
//! use arc_router::extract::Path;
//! use arc_router::params::ParamType;
//! use arc_router::router::get;
//! use arc_router::{handler_fn, Dispatcher, Request, Router};
//! use http::{Method, StatusCode};
//!
//! async fn user(Path(id): Path<i64>) -> String {
//!     format!("user {id}")
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = Router::builder()
//!     .route("/users/{id}", get(handler_fn(user).param("id", ParamType::Integer)))
//!     .build()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(router);
//!
//! let response = dispatcher.dispatch(Request::new(Method::GET, "/users/7")).await.unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let response = dispatcher.dispatch(Request::new(Method::GET, "/users/me")).await.unwrap();
//! assert_eq!(response.status(), StatusCode::BAD_REQUEST);
//! # }
//! ```

mod body;

mod dispatcher;
mod fn_trait;
mod handler;
mod rejection;
mod request;
mod responder;

pub mod extract;
pub mod params;
pub mod pattern;
pub mod router;

pub use body::ResponseBody;
pub use dispatcher::{BuildError, DispatchError, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use fn_trait::{BlockingFnTrait, FnTrait};
pub use handler::{blocking_fn, handler_fn, BlockingCall, BlockingFnHandler, FnHandler};
pub use handler::{BlockingRequestHandler, Handler, HandlerError, HandlerKind, HandlerResult, RequestHandler};
pub use rejection::Rejection;
pub use request::{PathParams, Request, RequestContext, RequestKind};
pub use responder::{Html, Json, Responder};
pub use router::Router;

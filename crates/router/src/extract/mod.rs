//! Handler argument extraction.
//!
//! Every handler argument implements [`FromArguments`]: it is built from the request context and
//! the typed [`Arguments`](crate::params::Arguments) produced by coercion. Extraction runs after
//! routing succeeded, so a failure here is a disagreement between a handler's argument types and
//! its declared signature; it is returned as a handler error, not as a routing rejection.

mod extract_params;
mod extract_request;
mod extract_tuple;
mod from_arguments;

pub use from_arguments::{ExtractError, FromArguments};

/// Represented as the path parameters of the matched route
///
/// A route with a single path parameter deserializes that value directly; a route with several
/// deserializes them, in template order, as a tuple.
/// note: the type must impl [`serde::de::DeserializeOwned`]
///
/// # Example
/// ```
/// # use arc_router::extract::Path;
/// pub async fn get_post(Path((user, post)): Path<(String, i64)>) -> String {
///     format!("post {post} of {user}")
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<T>(pub T);

/// Represented as url query data
///
/// Values are the coerced query parameters, with defaults filled in for absent optional ones,
/// note: the struct must impl [`serde::de::DeserializeOwned`]
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use arc_router::extract::Query;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     bar: Option<i64>,
///     verbose: bool,
/// }
///
/// pub async fn handle(Query(params): Query<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

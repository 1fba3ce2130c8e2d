use crate::handler::{Handler, HandlerKind};
use crate::params::Signature;
use crate::pattern::{self, CompiledMatcher, MatchOutcome};
use crate::router::error::RegistrationError;
use http::Method;

/// The methods a route can be registered under.
pub const METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// Parses a method name, ignoring ASCII case: `get` and `GET` are the same method.
pub fn parse_method(method: &str) -> Result<Method, RegistrationError> {
    METHODS
        .iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(method))
        .cloned()
        .ok_or_else(|| RegistrationError::InvalidMethod { method: method.to_owned() })
}

/// One `(method, path template)` binding to a handler.
///
/// A route is validated and compiled when it is created and is immutable afterwards.
#[derive(Debug)]
pub struct Route {
    path: String,
    matcher: CompiledMatcher,
    kind: HandlerKind,
    signature: Signature,
}

impl Route {
    /// Creates a route for `method`, given by name.
    pub fn new(path: impl Into<String>, handler: Handler, method: &str) -> Result<Self, RegistrationError> {
        Self::with_method(path, handler, parse_method(method)?)
    }

    /// Creates a GET route.
    pub fn get(path: impl Into<String>, handler: Handler) -> Result<Self, RegistrationError> {
        Self::with_method(path, handler, Method::GET)
    }

    pub fn with_method(path: impl Into<String>, handler: Handler, method: Method) -> Result<Self, RegistrationError> {
        let path = path.into();
        if !METHODS.contains(&method) {
            return Err(RegistrationError::InvalidMethod { method: method.to_string() });
        }

        let (kind, signature) = handler.into_parts();
        signature.validate().map_err(|reason| RegistrationError::InvalidHandler { path: path.clone(), reason })?;

        let params = pattern::get_path_params(&path)?;
        let matcher = pattern::compile(&path, &params, &method)?;

        Ok(Self { path, matcher, kind, signature })
    }

    /// The same route with its template moved under `prefix`.
    pub(crate) fn prefixed(self, prefix: &str) -> Result<Self, RegistrationError> {
        let path = join_path(prefix, &self.path);
        let params = pattern::get_path_params(&path)?;
        let matcher = pattern::compile(&path, &params, self.matcher.method())?;

        Ok(Self { path, matcher, ..self })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn method(&self) -> &Method {
        self.matcher.method()
    }

    #[inline]
    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }

    #[inline]
    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub(crate) fn match_request(&self, method: &Method, path: &str) -> MatchOutcome {
        self.matcher.match_request(method, path)
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    match path {
        "" | "/" if !prefix.is_empty() => prefix.to_owned(),
        _ if path.starts_with('/') => format!("{prefix}{path}"),
        _ => format!("{prefix}/{path}"),
    }
}

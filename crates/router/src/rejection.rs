//! Request-time routing failures.
//!
//! A [`Rejection`] is the recoverable outcome of a request that never reached a handler. It is
//! a value rather than an error: the dispatcher renders it as a response with the JSON error
//! envelope `{"Error": "<message>"}`.

use crate::body::ResponseBody;
use crate::params::{CoercionError, QueryError};
use crate::responder::with_content_type;
use crate::RequestKind;
use http::header::ALLOW;
use http::{HeaderValue, Method, Response, StatusCode};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The transport declared a protocol kind other than http or websocket.
    UnsupportedKind(RequestKind),

    /// No route template matches the path.
    NotFound { path: String },

    /// The path matches, but only under other methods.
    MethodNotAllowed { method: Method, path: String, allowed: Vec<Method> },

    /// The raw query string could not be decoded.
    MalformedQuery { reason: String },

    /// A supplied value could not be coerced to its declared type.
    InvalidParameter { field: String, reason: String },

    /// A required parameter was not supplied.
    MissingParameter { field: String },
}

impl Rejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Rejection::UnsupportedKind(_) => StatusCode::BAD_REQUEST,
            Rejection::NotFound { .. } => StatusCode::NOT_FOUND,
            Rejection::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Rejection::MalformedQuery { .. } => StatusCode::BAD_REQUEST,
            Rejection::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Rejection::MissingParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// The message carried in the error envelope.
    pub fn message(&self) -> String {
        match self {
            Rejection::UnsupportedKind(kind) => {
                format!("Invalid request type {kind}, expected http or websocket")
            }
            Rejection::NotFound { path } => format!("URL not found {path}"),
            Rejection::MethodNotAllowed { .. } => "Method not allowed".to_owned(),
            Rejection::MalformedQuery { reason } => {
                format!("Bad request, failed to parse query string: {reason}")
            }
            Rejection::InvalidParameter { reason, .. } => format!("Bad request, {reason}"),
            Rejection::MissingParameter { field } => format!("Missing required query parameter {field}"),
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let envelope = json!({ "Error": self.message() });
        let mut response = with_content_type(&mime::APPLICATION_JSON, ResponseBody::from(envelope.to_string()));
        *response.status_mut() = self.status_code();

        if let Rejection::MethodNotAllowed { allowed, .. } = &self {
            let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
        }

        response
    }
}

impl From<CoercionError> for Rejection {
    fn from(err: CoercionError) -> Self {
        match err {
            CoercionError::Parameter(e) => Rejection::InvalidParameter { field: e.field().to_owned(), reason: e.to_string() },
            CoercionError::Missing(e) => Rejection::MissingParameter { field: e.field().to_owned() },
        }
    }
}

impl From<QueryError> for Rejection {
    fn from(err: QueryError) -> Self {
        Rejection::MalformedQuery { reason: err.to_string() }
    }
}

use crate::pattern::TemplateError;
use http::Method;
use thiserror::Error;

/// Registration failures. They are meant to stop application startup and are never turned into
/// responses.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("invalid handler for route `{path}`: {reason}")]
    InvalidHandler { path: String, reason: String },

    #[error("invalid request method `{method}`")]
    InvalidMethod { method: String },

    #[error("route `{method} {path}` is already registered")]
    RouteConflict { method: Method, path: String },

    #[error(transparent)]
    InvalidTemplate(#[from] TemplateError),
}

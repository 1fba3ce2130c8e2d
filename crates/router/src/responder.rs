//! Converts handler return values into responses.
//!
//! This module provides the [`Responder`] trait which defines how a handler's return value is
//! turned into an HTTP response. It includes implementations for common types like Result,
//! Option, String, as well as the [`Json`] and [`Html`] wrappers.
//!
//! Responding is fallible: an `Err` returned by a handler is not rendered, it travels back to the
//! caller of the dispatcher as a handler error.

use crate::body::ResponseBody;
use crate::handler::{HandlerError, HandlerResult};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;
use serde::Serialize;

/// A trait for types that can be returned from request handlers.
pub trait Responder {
    fn respond(self) -> HandlerResult;
}

/// The Ok variant is responded, the Err variant is propagated to the dispatcher's caller.
impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<HandlerError>,
{
    fn respond(self) -> HandlerResult {
        match self {
            Ok(t) => t.respond(),
            Err(e) => Err(e.into()),
        }
    }
}

/// None case returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn respond(self) -> HandlerResult {
        match self {
            Some(t) => t.respond(),
            None => Ok(Response::new(ResponseBody::empty())),
        }
    }
}

/// Passes through pre-built responses.
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn respond(self) -> HandlerResult {
        Ok(self.map(|b| b.into()))
    }
}

/// Overrides the status code of the wrapped responder.
impl<T: Responder> Responder for (StatusCode, T) {
    fn respond(self) -> HandlerResult {
        let (status, responder) = self;
        let mut response = responder.respond()?;
        *response.status_mut() = status;
        Ok(response)
    }
}

impl<T: Responder> Responder for Box<T> {
    fn respond(self) -> HandlerResult {
        (*self).respond()
    }
}

impl Responder for () {
    fn respond(self) -> HandlerResult {
        Ok(Response::new(ResponseBody::empty()))
    }
}

impl Responder for &'static str {
    fn respond(self) -> HandlerResult {
        Ok(with_content_type(&mime::TEXT_PLAIN_UTF_8, ResponseBody::from(self)))
    }
}

impl Responder for String {
    fn respond(self) -> HandlerResult {
        Ok(with_content_type(&mime::TEXT_PLAIN_UTF_8, ResponseBody::from(self)))
    }
}

impl Responder for Bytes {
    fn respond(self) -> HandlerResult {
        Ok(with_content_type(&mime::APPLICATION_OCTET_STREAM, ResponseBody::from(self)))
    }
}

impl Responder for Vec<u8> {
    fn respond(self) -> HandlerResult {
        Bytes::from(self).respond()
    }
}

/// Serializes the wrapped value as an `application/json` response.
///
/// # Example
/// ```
/// # use arc_router::Json;
/// # use serde_json::{json, Value};
/// pub async fn status() -> Json<Value> {
///     Json(json!({ "healthy": true }))
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn respond(self) -> HandlerResult {
        let bytes = serde_json::to_vec(&self.0)?;
        Ok(with_content_type(&mime::APPLICATION_JSON, ResponseBody::from(bytes)))
    }
}

/// Responds the wrapped content as `text/html`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Html<T>(pub T);

impl<T: Into<ResponseBody>> Responder for Html<T> {
    fn respond(self) -> HandlerResult {
        Ok(with_content_type(&mime::TEXT_HTML_UTF_8, self.0.into()))
    }
}

pub(crate) fn with_content_type(content_type: &Mime, body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

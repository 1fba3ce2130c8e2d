use crate::extract::{ExtractError, FromArguments};
use crate::params::Arguments;
use crate::{Request, RequestContext};
use http::Method;
use tokio_util::sync::CancellationToken;

impl FromArguments for Method {
    #[inline]
    fn from_arguments(req: &RequestContext, _args: &Arguments) -> Result<Self, ExtractError> {
        Ok(req.method().clone())
    }
}

impl FromArguments for Request {
    #[inline]
    fn from_arguments(req: &RequestContext, _args: &Arguments) -> Result<Self, ExtractError> {
        Ok(req.request().clone())
    }
}

/// All coerced arguments, for handlers that look values up by name
impl FromArguments for Arguments {
    #[inline]
    fn from_arguments(_req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
        Ok(args.clone())
    }
}

/// The request-scoped cancellation signal
impl FromArguments for CancellationToken {
    #[inline]
    fn from_arguments(req: &RequestContext, _args: &Arguments) -> Result<Self, ExtractError> {
        Ok(req.cancellation().clone())
    }
}

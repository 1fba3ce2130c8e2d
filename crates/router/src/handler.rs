//! Request handlers.
//!
//! A [`Handler`] is what gets registered on a route: the handler itself, tagged with its kind,
//! plus the [`Signature`] its parameters are coerced with. The kind is decided once, when the
//! handler is built:
//!
//! - [`handler_fn`] wraps an async function; it is awaited on the async scheduler.
//! - [`blocking_fn`] wraps a plain function; the dispatcher runs it on the blocking pool so it
//!   can't stall unrelated requests.
//!
//! Handler arguments are extractors (see [`crate::extract`]), the return value is a
//! [`Responder`].

use crate::body::ResponseBody;
use crate::extract::FromArguments;
use crate::fn_trait::{BlockingFnTrait, FnTrait};
use crate::params::{Arguments, ParamType, Signature, Value};
use crate::responder::Responder;
use crate::RequestContext;
use async_trait::async_trait;
use http::Response;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Error raised by a handler. It is never turned into a response by the dispatcher.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<Response<ResponseBody>, HandlerError>;

/// A handler awaited on the async scheduler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &RequestContext, args: Arguments) -> HandlerResult;
}

/// A ready-to-run blocking invocation, moved onto the blocking pool as a whole.
pub type BlockingCall = Box<dyn FnOnce() -> HandlerResult + Send>;

/// A handler that blocks the calling thread.
///
/// Extraction happens on the async side in `prepare`; only the returned call runs on the
/// blocking pool.
pub trait BlockingRequestHandler: Send + Sync {
    fn prepare(&self, req: &RequestContext, args: Arguments) -> Result<BlockingCall, HandlerError>;
}

/// The kind of a registered handler.
pub enum HandlerKind {
    NonBlocking(Box<dyn RequestHandler>),
    Blocking(Box<dyn BlockingRequestHandler>),
}

impl HandlerKind {
    #[inline]
    pub fn is_blocking(&self) -> bool {
        matches!(self, HandlerKind::Blocking(_))
    }
}

impl fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::NonBlocking(_) => f.write_str("NonBlocking"),
            HandlerKind::Blocking(_) => f.write_str("Blocking"),
        }
    }
}

/// A handler together with its parameter signature, ready to be registered.
#[derive(Debug)]
pub struct Handler {
    kind: HandlerKind,
    signature: Signature,
}

impl Handler {
    pub fn non_blocking<H: RequestHandler + 'static>(handler: H) -> Self {
        Self { kind: HandlerKind::NonBlocking(Box::new(handler)), signature: Signature::new() }
    }

    pub fn blocking<H: BlockingRequestHandler + 'static>(handler: H) -> Self {
        Self { kind: HandlerKind::Blocking(Box::new(handler)), signature: Signature::new() }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Declares a required parameter of type `ty`.
    #[must_use]
    pub fn param(mut self, name: impl Into<Arc<str>>, ty: ParamType) -> Self {
        self.signature = self.signature.param(name, ty);
        self
    }

    /// Declares a parameter of type `ty` that falls back to `default` when absent.
    #[must_use]
    pub fn optional(mut self, name: impl Into<Arc<str>>, ty: ParamType, default: impl Into<Value>) -> Self {
        self.signature = self.signature.optional(name, ty, default);
        self
    }

    /// Declares a required parameter passed through as a raw string.
    #[must_use]
    pub fn untyped(mut self, name: impl Into<Arc<str>>) -> Self {
        self.signature = self.signature.untyped(name);
        self
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn into_parts(self) -> (HandlerKind, Signature) {
        (self.kind, self.signature)
    }
}

/// a `FnTrait` holder which represents any async Fn
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

impl<F, Args> fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Builds a non-blocking handler from an async function.
pub fn handler_fn<F, Args>(f: F) -> Handler
where
    F: FnTrait<Args> + 'static,
    F::Output: Responder,
    Args: FromArguments + Send + 'static,
{
    Handler::non_blocking(FnHandler::new(f))
}

#[async_trait]
impl<F, Args> RequestHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Responder,
    Args: FromArguments + Send,
{
    async fn invoke(&self, req: &RequestContext, args: Arguments) -> HandlerResult {
        let args = Args::from_arguments(req, &args)?;
        self.f.call(args).await.respond()
    }
}

/// a `BlockingFnTrait` holder which represents any blocking Fn
pub struct BlockingFnHandler<F, Args> {
    f: Arc<F>,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> BlockingFnHandler<F, Args>
where
    F: BlockingFnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f: Arc::new(f), _phantom: PhantomData }
    }
}

impl<F, Args> fmt::Debug for BlockingFnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingFnHandler").finish_non_exhaustive()
    }
}

/// Builds a blocking handler from a plain function.
pub fn blocking_fn<F, Args>(f: F) -> Handler
where
    F: BlockingFnTrait<Args>,
    F::Output: Responder,
    Args: FromArguments + Send + 'static,
{
    Handler::blocking(BlockingFnHandler::new(f))
}

impl<F, Args> BlockingRequestHandler for BlockingFnHandler<F, Args>
where
    F: BlockingFnTrait<Args>,
    F::Output: Responder,
    Args: FromArguments + Send + 'static,
{
    fn prepare(&self, req: &RequestContext, args: Arguments) -> Result<BlockingCall, HandlerError> {
        let args = Args::from_arguments(req, &args)?;
        let f = Arc::clone(&self.f);
        Ok(Box::new(move || f.call(args).respond()))
    }
}

use crate::params::Arguments;
use crate::RequestContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to deserialize path parameters: {source}")]
    Path { source: serde_json::Error },

    #[error("failed to deserialize query parameters: {source}")]
    Query { source: serde_json::Error },
}

pub trait FromArguments: Sized {
    fn from_arguments(req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError>;
}

impl<T> FromArguments for Option<T>
where
    T: FromArguments,
{
    fn from_arguments(req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
        Ok(T::from_arguments(req, args).ok())
    }
}

impl<T> FromArguments for Result<T, ExtractError>
where
    T: FromArguments,
{
    fn from_arguments(req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
        Ok(T::from_arguments(req, args))
    }
}

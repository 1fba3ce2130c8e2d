//! Typed path and query parameter extraction.
//!
//! Both extractors deserialize from the already coerced JSON values, so a handler declaring
//! `bar: integer` in its signature can take `Path<i64>` and get the number as is.

use crate::extract::{ExtractError, FromArguments, Path, Query};
use crate::params::Arguments;
use crate::RequestContext;
use serde::de::DeserializeOwned;

impl<T> FromArguments for Path<T>
where
    T: DeserializeOwned,
{
    fn from_arguments(_req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
        serde_json::from_value(args.path_document()).map(Path).map_err(|source| ExtractError::Path { source })
    }
}

impl<T> FromArguments for Query<T>
where
    T: DeserializeOwned,
{
    fn from_arguments(_req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
        serde_json::from_value(args.query_document()).map(Query).map_err(|source| ExtractError::Query { source })
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::{ExtractError, FromArguments, Path, Query};
    use crate::params::{coerce, ParamType, QueryParams, Signature, Value};
    use crate::{PathParams, Request, RequestContext};
    use http::Method;
    use serde::Deserialize;
    use std::sync::{Arc, Weak};
    use tokio_util::sync::CancellationToken;

    fn context() -> RequestContext {
        RequestContext::new(Request::new(Method::GET, "/"), Weak::new(), CancellationToken::new())
    }

    fn path(values: &[(&str, &str)]) -> PathParams {
        PathParams::new(values.iter().map(|(k, v)| (Arc::from(*k), (*v).to_owned())).collect())
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Params {
        bar: Option<i64>,
        tags: Vec<String>,
    }

    #[test]
    fn test_single_path_value() {
        let signature = Signature::new().param("id", ParamType::Integer);
        let args = coerce(&signature, &path(&[("id", "7")]), &QueryParams::default()).unwrap();

        let Path(id) = Path::<i64>::from_arguments(&context(), &args).unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn test_path_values_as_tuple() {
        let signature = Signature::new().param("post", ParamType::Integer);
        let args =
            coerce(&signature, &path(&[("user", "alice"), ("post", "3")]), &QueryParams::default()).unwrap();

        let Path((user, post)) = Path::<(String, i64)>::from_arguments(&context(), &args).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(post, 3);
    }

    #[test]
    fn test_path_type_disagrees_with_signature() {
        let args = coerce(&Signature::new(), &path(&[("id", "7")]), &QueryParams::default()).unwrap();

        let err = Path::<i64>::from_arguments(&context(), &args).unwrap_err();
        assert!(matches!(err, ExtractError::Path { .. }));
    }

    #[test]
    fn test_query_struct_with_defaults() {
        let signature = Signature::new()
            .optional("bar", ParamType::Integer, Value::Null)
            .param("tags", ParamType::list(ParamType::String));
        let query = QueryParams::parse(b"tags=a&tags=b").unwrap();
        let args = coerce(&signature, &PathParams::empty(), &query).unwrap();

        let Query(params) = Query::<Params>::from_arguments(&context(), &args).unwrap();
        assert_eq!(params, Params { bar: None, tags: vec!["a".into(), "b".into()] });
    }

    #[test]
    fn test_optional_extractor_swallows_failure() {
        let args = coerce(&Signature::new(), &PathParams::empty(), &QueryParams::default()).unwrap();

        let extracted = Option::<Query<Params>>::from_arguments(&context(), &args).unwrap();
        assert!(extracted.is_none());
    }
}

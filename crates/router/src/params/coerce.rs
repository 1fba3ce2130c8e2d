use super::{ParamType, QueryParams, Signature, Value};
use crate::PathParams;
use std::sync::Arc;
use thiserror::Error;

/// A supplied value could not be converted to the declared type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse parameter `{field}`: expected {expected}, got {raw_value:?}")]
pub struct ParameterCoercionError {
    field: String,
    raw_value: String,
    expected: ParamType,
}

impl ParameterCoercionError {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn expected_type(&self) -> &ParamType {
        &self.expected
    }
}

/// A required parameter was supplied neither in the path nor in the query string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required parameter `{field}`")]
pub struct MissingParameterError {
    field: String,
}

impl MissingParameterError {
    pub fn field(&self) -> &str {
        &self.field
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error(transparent)]
    Parameter(#[from] ParameterCoercionError),

    #[error(transparent)]
    Missing(#[from] MissingParameterError),
}

/// Typed invocation arguments of one request.
///
/// Path values keep template declaration order and are handed to handlers positionally; query
/// values are looked up by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    path: Vec<(Arc<str>, Value)>,
    query: Vec<(String, Value)>,
}

impl Arguments {
    /// Path values in template declaration order.
    pub fn path_values(&self) -> impl Iterator<Item = &Value> {
        self.path.iter().map(|(_, value)| value)
    }

    pub fn path(&self, name: &str) -> Option<&Value> {
        self.path.iter().find(|(key, _)| key.as_ref() == name).map(|(_, value)| value)
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    pub fn query(&self, name: &str) -> Option<&Value> {
        self.query.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn query_values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.query.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The path values as one JSON value: the value itself for a single parameter, an array
    /// otherwise.
    pub(crate) fn path_document(&self) -> Value {
        match self.path.as_slice() {
            [(_, value)] => value.clone(),
            values => Value::Array(values.iter().map(|(_, value)| value.clone()).collect()),
        }
    }

    /// The query values as one JSON object.
    pub(crate) fn query_document(&self) -> Value {
        Value::Object(self.query.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
    }
}

/// Coerces the raw captures of a request according to `signature`.
///
/// Parameters the signature doesn't type pass through as strings. Supplied values are checked
/// first, path before query, so a malformed value is reported even if another parameter is
/// also missing.
pub fn coerce(signature: &Signature, path: &PathParams, query: &QueryParams) -> Result<Arguments, CoercionError> {
    let mut arguments = Arguments::default();

    for (name, raw) in path.entries() {
        let value = coerce_one(name, signature.type_of(name), std::slice::from_ref(raw))?;
        arguments.path.push((Arc::clone(name), value));
    }

    for (key, raw) in query.iter() {
        let value = coerce_one(key, signature.type_of(key), raw)?;
        arguments.query.push((key.to_owned(), value));
    }

    for spec in signature.iter() {
        if path.get(spec.name()).is_some() || query.contains(spec.name()) {
            continue;
        }

        match spec.default_value() {
            Some(default) => arguments.query.push((spec.name().to_owned(), default.clone())),
            None => return Err(MissingParameterError { field: spec.name().to_owned() }.into()),
        }
    }

    Ok(arguments)
}

fn coerce_one(field: &str, ty: Option<&ParamType>, raw: &[String]) -> Result<Value, ParameterCoercionError> {
    let Some(ty) = ty else {
        return Ok(raw.first().map_or(Value::Null, |value| Value::String(value.clone())));
    };

    ty.coerce(raw).map_err(|raw_value| ParameterCoercionError {
        field: field.to_owned(),
        raw_value: raw_value.to_owned(),
        expected: ty.clone(),
    })
}

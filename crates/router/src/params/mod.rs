//! Parameter schemas and coercion.
//!
//! Each handler declares a [`Signature`]: the parameters it takes, the type each one is coerced
//! to and, for query parameters, an optional default. The signature is captured once when the
//! route is registered; at dispatch time [`coerce`] turns the raw path and query captures into
//! typed [`Arguments`].
//!
//! # Example
//! ```
//! use arc_router::params::{ParamType, Signature};
//!
//! let signature = Signature::new()
//!     .param("id", ParamType::Integer)
//!     .optional("verbose", ParamType::Boolean, false)
//!     .optional("tags", ParamType::list(ParamType::String), serde_json::Value::Null)
//!     .untyped("cursor");
//!
//! assert_eq!(signature.len(), 4);
//! ```

mod coerce;
mod query;

pub use coerce::{coerce, Arguments, CoercionError, MissingParameterError, ParameterCoercionError};
pub use query::{QueryError, QueryParams};
pub use serde_json::Value;

use serde_json::Number;
use std::fmt;
use std::sync::Arc;

/// The type a parameter is coerced to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    /// A signed 64-bit integer.
    Integer,
    /// A finite 64-bit float.
    Float,
    /// `true/false`, `1/0`, `yes/no`, `on/off`, `t/f` or `y/n`, case-insensitive.
    Boolean,
    /// Any JSON document.
    Json,
    /// A sequence; every supplied value of the parameter is coerced to the inner type.
    List(Box<ParamType>),
}

impl ParamType {
    pub fn list(inner: ParamType) -> Self {
        ParamType::List(Box::new(inner))
    }

    #[inline]
    pub fn is_sequence(&self) -> bool {
        matches!(self, ParamType::List(_))
    }

    /// Parses a single raw value.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        match self {
            ParamType::String => Some(Value::String(raw.to_owned())),
            ParamType::Integer => raw.parse::<i64>().ok().map(Value::from),
            ParamType::Float => raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
            ParamType::Boolean => parse_bool(raw).map(Value::Bool),
            ParamType::Json => serde_json::from_str(raw).ok(),
            ParamType::List(_) => serde_json::from_str::<Value>(raw).ok().filter(|value| self.accepts(value)),
        }
    }

    /// Coerces every raw value supplied for a parameter.
    ///
    /// Sequence types consume the whole list, the others only the first value. On failure the
    /// offending raw value is returned.
    pub fn coerce<'a>(&self, raw: &'a [String]) -> Result<Value, &'a str> {
        match self {
            ParamType::List(inner) => raw
                .iter()
                .map(|value| inner.parse(value).ok_or(value.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => {
                let first = raw.first().map_or("", String::as_str);
                self.parse(first).ok_or(first)
            }
        }
    }

    /// Whether `value` is a valid instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Json => true,
            ParamType::List(inner) => value.as_array().is_some_and(|items| items.iter().all(|item| inner.accepts(item))),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => f.write_str("string"),
            ParamType::Integer => f.write_str("integer"),
            ParamType::Float => f.write_str("float"),
            ParamType::Boolean => f.write_str("boolean"),
            ParamType::Json => f.write_str("json"),
            ParamType::List(inner) => write!(f, "list[{inner}]"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: Arc<str>,
    ty: Option<ParamType>,
    default: Option<Value>,
}

impl ParamSpec {
    /// A required, untyped parameter.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into(), ty: None, default: None }
    }

    #[must_use]
    pub fn typed(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Makes the parameter optional; `Value::Null` stands for "no value".
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> Option<&ParamType> {
        self.ty.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The parameter schema of a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declares a required parameter of type `ty`.
    #[must_use]
    pub fn param(self, name: impl Into<Arc<str>>, ty: ParamType) -> Self {
        self.with(ParamSpec::new(name).typed(ty))
    }

    /// Declares a parameter of type `ty` that falls back to `default` when absent.
    #[must_use]
    pub fn optional(self, name: impl Into<Arc<str>>, ty: ParamType, default: impl Into<Value>) -> Self {
        self.with(ParamSpec::new(name).typed(ty).with_default(default))
    }

    /// Declares a required parameter whose raw string is passed through as is.
    #[must_use]
    pub fn untyped(self, name: impl Into<Arc<str>>) -> Self {
        self.with(ParamSpec::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name() == name)
    }

    pub fn type_of(&self, name: &str) -> Option<&ParamType> {
        self.get(name).and_then(ParamSpec::ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Checks that the signature can be dispatched to, returning the reason when it can't.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (index, spec) in self.params.iter().enumerate() {
            if self.params[..index].iter().any(|other| other.name == spec.name) {
                return Err(format!("parameter `{}` is declared more than once", spec.name));
            }

            if let (Some(ty), Some(default)) = (&spec.ty, &spec.default) {
                if !default.is_null() && !ty.accepts(default) {
                    return Err(format!("default {default} of parameter `{}` is not a valid {ty}", spec.name));
                }
            }
        }
        Ok(())
    }
}

//! Path template compilation.
//!
//! A path template is a literal path with `{name}` placeholders, e.g. `/users/{id}/posts/{post_id}`.
//! Every placeholder captures one or more `[a-zA-Z0-9_]` characters, everything else is matched
//! verbatim. Brace groups that don't hold a valid identifier (`{1st}`, `{}`) are plain literals.
//!
//! A [`CompiledMatcher`] is bound to the method of the route it belongs to, so that one scan over
//! the route table can tell a full match apart from a path that only exists under another method.
//!
//! # Example
//! ```
//! use arc_router::pattern::{compile, get_path_params, MatchOutcome};
//! use http::Method;
//!
//! let params = get_path_params("/foo/{bar}").unwrap();
//! let matcher = compile("/foo/{bar}", &params, &Method::GET).unwrap();
//!
//! match matcher.match_request(&Method::GET, "/foo/10") {
//!     MatchOutcome::Matched(captures) => assert_eq!(captures.get("bar"), Some("10")),
//!     _ => unreachable!(),
//! }
//! ```

use crate::PathParams;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("placeholder regex must be valid"));

const CAPTURE_CLASS: &str = "[a-zA-Z0-9_]+";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("path parameter `{name}` appears more than once in `{template}`")]
    DuplicateParameter { template: String, name: String },

    #[error("failed to compile path template `{template}`: {source}")]
    Compile { template: String, source: regex::Error },
}

/// Extracts the placeholder names of `template`, in order of appearance.
///
/// Fails when the same name is used twice.
pub fn get_path_params(template: &str) -> Result<Vec<Arc<str>>, TemplateError> {
    let mut params: Vec<Arc<str>> = Vec::new();

    for captures in PLACEHOLDER.captures_iter(template) {
        let Some(name) = captures.get(1).map(|m| m.as_str()) else {
            continue;
        };

        if params.iter().any(|param| param.as_ref() == name) {
            return Err(TemplateError::DuplicateParameter { template: template.to_owned(), name: name.to_owned() });
        }
        params.push(Arc::from(name));
    }

    Ok(params)
}

/// Compiles `template` into a matcher bound to `method`.
///
/// Only placeholders listed in `params` become captures; the rest of the template, including any
/// regex metacharacters, is escaped. The same inputs always produce an equal matcher.
pub fn compile(template: &str, params: &[Arc<str>], method: &Method) -> Result<CompiledMatcher, TemplateError> {
    let mut pattern = String::with_capacity(template.len() + params.len() * 24 + 2);
    pattern.push('^');

    let mut literal_start = 0;
    for found in PLACEHOLDER.find_iter(template) {
        let placeholder = found.as_str();
        let name = &placeholder[1..placeholder.len() - 1];
        if !params.iter().any(|param| param.as_ref() == name) {
            continue;
        }

        pattern.push_str(&regex::escape(&template[literal_start..found.start()]));
        pattern.push_str("(?P<");
        pattern.push_str(name);
        pattern.push('>');
        pattern.push_str(CAPTURE_CLASS);
        pattern.push(')');
        literal_start = found.end();
    }
    pattern.push_str(&regex::escape(&template[literal_start..]));
    pattern.push('$');

    let regex =
        Regex::new(&pattern).map_err(|source| TemplateError::Compile { template: template.to_owned(), source })?;

    Ok(CompiledMatcher { method: method.clone(), regex, params: params.into() })
}

/// Result of testing a request against one [`CompiledMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Both method and path match.
    Matched(PathParams),
    /// The path matches but the matcher belongs to another method.
    PathOnly,
    NoMatch,
}

/// A compiled path template, bound to the method of its route.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    method: Method,
    regex: Regex,
    params: Arc<[Arc<str>]>,
}

impl CompiledMatcher {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The anchored regular expression this matcher runs.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter names in template declaration order.
    pub fn params(&self) -> &[Arc<str>] {
        &self.params
    }

    /// Matches the path alone, ignoring the method.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        let values = self
            .params
            .iter()
            .filter_map(|name| captures.name(name).map(|value| (Arc::clone(name), value.as_str().to_owned())))
            .collect();
        Some(PathParams::new(values))
    }

    pub fn match_request(&self, method: &Method, path: &str) -> MatchOutcome {
        if self.method != method {
            return if self.regex.is_match(path) { MatchOutcome::PathOnly } else { MatchOutcome::NoMatch };
        }

        match self.captures(path) {
            Some(params) => MatchOutcome::Matched(params),
            None => MatchOutcome::NoMatch,
        }
    }
}

impl PartialEq for CompiledMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.regex.as_str() == other.regex.as_str() && self.params == other.params
    }
}

impl Eq for CompiledMatcher {}

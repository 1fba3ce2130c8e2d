//! URL query string parsing.
//!
//! A query string is decoded into a multi-valued mapping: every key keeps all of its values in
//! the order they were supplied, and keys keep the order of their first appearance. Keys whose
//! value is empty (`?a=` or `?a`) are treated as not supplied.
//!
//! Decoding is strict: a `%` not followed by two hex digits, or bytes that don't decode to UTF-8,
//! fail the whole query string.

use percent_encoding::percent_decode;
use std::str::Utf8Error;
use thiserror::Error;

/// Error returned when a query string can't be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid percent-encoding in `{segment}`")]
    InvalidEscape { segment: String },

    #[error("`{segment}` is not valid UTF-8: {source}")]
    InvalidUtf8 { segment: String, source: Utf8Error },
}

/// Decoded query parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Parses a raw `application/x-www-form-urlencoded` query string, without the leading `?`.
    pub fn parse(query: &[u8]) -> Result<Self, QueryError> {
        let mut params = QueryParams::default();

        for pair in query.split(|b| *b == b'&').filter(|pair| !pair.is_empty()) {
            let (key, value) = match pair.iter().position(|b| *b == b'=') {
                Some(index) => (&pair[..index], &pair[index + 1..]),
                None => (pair, &pair[pair.len()..]),
            };

            let key = decode(key)?;
            let value = decode(value)?;
            if value.is_empty() {
                continue;
            }
            params.push(key, value);
        }
        Ok(params)
    }

    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// All values supplied for `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, values)| values.as_slice())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode(raw: &[u8]) -> Result<String, QueryError> {
    let segment = || String::from_utf8_lossy(raw).into_owned();

    let malformed_escape = raw.iter().enumerate().any(|(index, b)| {
        *b == b'%'
            && !(raw.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
                && raw.get(index + 2).is_some_and(u8::is_ascii_hexdigit))
    });
    if malformed_escape {
        return Err(QueryError::InvalidEscape { segment: segment() });
    }

    let plus_decoded: Vec<u8> = raw.iter().map(|b| if *b == b'+' { b' ' } else { *b }).collect();
    percent_decode(&plus_decoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|source| QueryError::InvalidUtf8 { segment: segment(), source })
}

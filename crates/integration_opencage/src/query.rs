//! Query string construction for the OpenCage API
//!
//! OpenCage expects the `q` parameter in a pre-escaped form (spaces as `+`,
//! commas as `%2C`) and rejects a second layer of percent-encoding. The
//! encoder therefore runs a regular percent-encoding pass and then decodes
//! the result again, so every value reaches the wire exactly as the caller
//! (or [`escape_address`]) wrote it.
//!
//! Values containing `&` or `=` are not protected and will split the
//! parameter. The service gives no way to express them.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left untouched by the encoding pass
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Free text
    Text(String),
    /// Integral number
    Integer(i64),
    /// Floating point number, e.g. a coordinate
    Float(f64),
    /// Boolean flag, rendered as `true`/`false`
    Bool(bool),
}

impl QueryValue {
    /// Returns true for an empty text value
    ///
    /// Numbers and booleans are never blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered query parameter mapping
///
/// Keeps insertion order. Inserting a key that is already present replaces
/// its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Create an empty mapping
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Copy every entry of `other` into this mapping, `other` winning on collisions
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Look up a parameter value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate over parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Pre-escape free-text address input for the `q` parameter
///
/// Whitespace becomes `+` and commas become the literal `%2C`.
#[must_use]
pub fn escape_address(address: &str) -> String {
    let mut escaped = String::with_capacity(address.len() + 8);
    for c in address.chars() {
        match c {
            c if c.is_whitespace() => escaped.push('+'),
            ',' => escaped.push_str("%2C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build the query string sent to OpenCage
#[must_use]
pub fn encode(params: &QueryParams) -> String {
    unescape(&stringify(params))
}

fn stringify(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key), escape(&value.to_string())))
        .collect::<Vec<_>>()
        .join("&")
}

fn escape(input: &str) -> String {
    utf8_percent_encode(input, QUERY_COMPONENT).to_string()
}

fn unescape(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

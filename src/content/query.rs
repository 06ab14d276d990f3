//! Query descriptors for list and detail requests
//!
//! A [`Queries`] value keeps keys in insertion order so that the query string
//! sent upstream matches the order the caller built it in. The same
//! serialization is used for direct calls and for the proxy route.

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters left alone by JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Rejected `queries` input
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("queries is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("queries must be a JSON object")]
    NotAnObject,
    #[error("query parameter {0:?} is not a scalar")]
    NotScalar(String),
}

/// A scalar query value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for QueryValue {
    /// Formats the way JavaScript's `String(value)` would
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Bool(b) => write!(f, "{}", b),
            QueryValue::Integer(n) => write!(f, "{}", n),
            QueryValue::Float(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            QueryValue::Float(n) => write!(f, "{}", n),
            QueryValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(value.into())
    }
}

impl From<usize> for QueryValue {
    fn from(value: usize) -> Self {
        QueryValue::Integer(value as i64)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl TryFrom<serde_json::Value> for QueryValue {
    type Error = ();

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(QueryValue::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(QueryValue::Integer(i)),
                None => n.as_f64().map(QueryValue::Float).ok_or(()),
            },
            serde_json::Value::String(s) => Ok(QueryValue::String(s)),
            _ => Err(()),
        }
    }
}

/// Ordered filter/sort/pagination parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Queries(IndexMap<String, QueryValue>);

impl Queries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of scalars, keeping its key order
    pub fn from_json(raw: &str) -> Result<Self, QueryError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let serde_json::Value::Object(object) = value else {
            return Err(QueryError::NotAnObject);
        };

        let mut queries = Self::new();
        for (key, value) in object {
            let value =
                QueryValue::try_from(value).map_err(|_| QueryError::NotScalar(key.clone()))?;
            queries.0.insert(key, value);
        }
        Ok(queries)
    }

    /// Serialize as the JSON object the proxy route expects
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// `key=value&...` with values percent-encoded; empty when there are no keys
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| {
                let value = value.to_string();
                format!("{}={}", key, utf8_percent_encode(&value, COMPONENT))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Set an arbitrary parameter, replacing any previous value in place
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn limit(self, limit: usize) -> Self {
        self.insert("limit", limit)
    }

    pub fn offset(self, offset: usize) -> Self {
        self.insert("offset", offset)
    }

    /// Sort order, e.g. `-publishedAt`
    pub fn orders(self, orders: &str) -> Self {
        self.insert("orders", orders)
    }

    /// Full-text search
    pub fn q(self, q: &str) -> Self {
        self.insert("q", q)
    }

    /// Comma separated field list
    pub fn fields(self, fields: &str) -> Self {
        self.insert("fields", fields)
    }

    pub fn ids(self, ids: &str) -> Self {
        self.insert("ids", ids)
    }

    /// Filter expression, e.g. `category[equals]rust`
    pub fn filters(self, filters: &str) -> Self {
        self.insert("filters", filters)
    }

    /// Reference expansion depth
    pub fn depth(self, depth: u32) -> Self {
        self.insert("depth", depth)
    }

    pub fn draft_key(self, draft_key: &str) -> Self {
        self.insert("draftKey", draft_key)
    }
}

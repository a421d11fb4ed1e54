//! Bind parameters produced by the compiler.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::Serialize;

use crate::schema::format_timestamp;

/// A value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    /// A UTC instant, bound in the store's canonical timestamp encoding.
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{:?}", s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ParamValue::Text(s) => ToSqlOutput::from(s.as_str()),
            ParamValue::Int(n) => ToSqlOutput::from(*n),
            ParamValue::Timestamp(ts) => ToSqlOutput::from(format_timestamp(ts)),
        })
    }
}

/// Parameter name → value. Names are `p0`, `p1`, ... without the leading colon.
pub type Params = BTreeMap<String, ParamValue>;

/// Placeholder name for the `index`-th parameter.
pub fn param_name(index: usize) -> String {
    format!("p{}", index)
}

/// Pair each parameter with its `:name` placeholder for rusqlite's named binding.
pub fn named_bindings(params: &Params) -> Vec<(String, &dyn ToSql)> {
    params
        .iter()
        .map(|(name, value)| (format!(":{}", name), value as &dyn ToSql))
        .collect()
}

//! The structured request model.
//!
//! A [`Specification`] describes one analytics question: which table, which
//! aggregate over which field, and a conjunction of filter [`Condition`]s.
//! Nothing here is checked against the schema registry; that is the
//! compiler's job.

mod document;

pub use document::strip_code_fences;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::Table;

/// Scalar-producing aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// `COUNT(*)`
    CountRows,
    /// `COALESCE(SUM(field), 0)`
    SumField,
    /// `COUNT(DISTINCT field)`
    CountDistinct,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [
        Aggregation::CountRows,
        Aggregation::SumField,
        Aggregation::CountDistinct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::CountRows => "count_rows",
            Aggregation::SumField => "sum_field",
            Aggregation::CountDistinct => "count_distinct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Aggregation::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    /// `column = value`
    Eq,
    /// `column > value`
    Gt,
    /// `value <= column < value2`, both ISO-8601 instants.
    BetweenDatetime,
    /// `column` falls on the UTC calendar day `value` (`YYYY-MM-DD`).
    DateEq,
}

impl ConditionOp {
    pub const ALL: [ConditionOp; 4] = [
        ConditionOp::Eq,
        ConditionOp::Gt,
        ConditionOp::BetweenDatetime,
        ConditionOp::DateEq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOp::Eq => "eq",
            ConditionOp::Gt => "gt",
            ConditionOp::BetweenDatetime => "between_datetime",
            ConditionOp::DateEq => "date_eq",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ConditionOp::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter operand: text or a 64-bit integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Int(n) => write!(f, "{}", n),
            ConditionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ConditionValue {
    fn from(n: i64) -> Self {
        ConditionValue::Int(n)
    }
}

impl From<i32> for ConditionValue {
    fn from(n: i32) -> Self {
        ConditionValue::Int(n.into())
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        ConditionValue::Text(s.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(s: String) -> Self {
        ConditionValue::Text(s)
    }
}

/// One filter clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub column: String,
    pub op: ConditionOp,
    pub value: ConditionValue,
    /// End of the range; only meaningful for `between_datetime`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<ConditionValue>,
}

impl Condition {
    pub fn new(column: &str, op: ConditionOp, value: impl Into<ConditionValue>) -> Self {
        Self {
            column: column.to_string(),
            op,
            value: value.into(),
            value2: None,
        }
    }

    pub fn eq(column: &str, value: impl Into<ConditionValue>) -> Self {
        Self::new(column, ConditionOp::Eq, value)
    }

    pub fn gt(column: &str, value: impl Into<ConditionValue>) -> Self {
        Self::new(column, ConditionOp::Gt, value)
    }

    pub fn between_datetime(
        column: &str,
        start: impl Into<ConditionValue>,
        end: impl Into<ConditionValue>,
    ) -> Self {
        Self::new(column, ConditionOp::BetweenDatetime, start).with_value2(end)
    }

    pub fn date_eq(column: &str, day: impl Into<ConditionValue>) -> Self {
        Self::new(column, ConditionOp::DateEq, day)
    }

    pub fn with_value2(mut self, value2: impl Into<ConditionValue>) -> Self {
        self.value2 = Some(value2.into());
        self
    }
}

/// A complete request: `aggregation(field)` over `table` where all `filters` hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "document::RawSpecification")]
pub struct Specification {
    pub table: Table,
    pub aggregation: Aggregation,
    pub field: String,
    pub filters: Vec<Condition>,
}

impl Specification {
    pub fn new(table: Table, aggregation: Aggregation, field: &str) -> Self {
        Self {
            table,
            aggregation,
            field: field.to_string(),
            filters: Vec::new(),
        }
    }

    /// Append a condition, AND-ed with the existing ones.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Serialize back to the document shape accepted by [`Specification::from_json`].
    pub fn to_json(&self) -> String {
        // Only strings, integers and unit enums: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

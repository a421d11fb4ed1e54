//! JSON document boundary for specifications.
//!
//! Producers (a language model, a test fixture, a file on disk) hand over
//! JSON text. Parsing happens in two passes: a structural pass into raw
//! strings, then a vocabulary pass that maps tags onto the closed enums.
//! Both passes report through [`SpecError`] so callers see one error family.

use serde::Deserialize;

use super::{Aggregation, Condition, ConditionOp, ConditionValue, Specification};
use crate::compile::{SpecError, SpecResult};
use crate::schema::Table;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSpecification {
    table: String,
    aggregation: String,
    field: String,
    #[serde(default)]
    filters: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCondition {
    column: String,
    op: String,
    value: ConditionValue,
    #[serde(default)]
    value2: Option<ConditionValue>,
}

impl TryFrom<RawSpecification> for Specification {
    type Error = SpecError;

    fn try_from(raw: RawSpecification) -> SpecResult<Self> {
        let table = Table::from_name(&raw.table).ok_or(SpecError::UnknownTable(raw.table))?;
        let aggregation = Aggregation::from_name(&raw.aggregation)
            .ok_or(SpecError::UnknownAggregation(raw.aggregation))?;

        let filters = raw
            .filters
            .into_iter()
            .map(|c| {
                let op = ConditionOp::from_name(&c.op).ok_or(SpecError::UnknownOperator(c.op))?;
                Ok(Condition {
                    column: c.column,
                    op,
                    value: c.value,
                    value2: c.value2,
                })
            })
            .collect::<SpecResult<Vec<_>>>()?;

        Ok(Specification {
            table,
            aggregation,
            field: raw.field,
            filters,
        })
    }
}

impl Specification {
    /// Parse a specification document.
    ///
    /// Markdown code fences around the object are tolerated. Structural
    /// problems (missing keys, extra keys, values that are neither text nor
    /// a 64-bit integer) yield [`SpecError::Malformed`]; unknown tags yield
    /// the matching `Unknown*` variant.
    pub fn from_json(text: &str) -> SpecResult<Self> {
        let raw: RawSpecification = serde_json::from_str(strip_code_fences(text))
            .map_err(|e| SpecError::Malformed(e.to_string()))?;
        Specification::try_from(raw)
    }
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

//! Compilation from a [`Specification`] to parameterized SQL.
//!
//! ```text
//! Specification → validate against SchemaRegistry → Query AST → SQL text + Params
//! ```
//!
//! Identifiers (table, field, filter columns) are looked up in the registry
//! and the registry's own `&'static str` is what gets emitted, so nothing the
//! caller typed reaches the SQL text. Values only travel as named parameters.
//! Any violation aborts before a statement exists.
//!
//! # Example
//!
//! ```
//! use clipcount::compile::compile;
//! use clipcount::schema::Table;
//! use clipcount::spec::{Aggregation, Condition, Specification};
//!
//! let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
//!     .filter(Condition::gt("views_count", 100_000));
//! let compiled = compile(&spec)?;
//! assert_eq!(compiled.sql, "SELECT COUNT(*) AS value FROM videos WHERE views_count > :p0;");
//! # Ok::<(), clipcount::compile::SpecError>(())
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{parse_iso_date, parse_iso_instant, SchemaRegistry, Table};
use crate::spec::{Aggregation, Condition, ConditionOp, ConditionValue, Specification};
use crate::sql::{
    coalesce, col, count_distinct, count_star, lit_int, param, param_name, sum, Expr, ExprExt,
    ParamValue, Params, Query, SelectExpr,
};

// ============================================================================
// Error Types
// ============================================================================

/// Reasons a specification is refused before any SQL is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Field '{field}' is not allowed for table '{table}'")]
    UnknownField { table: Table, field: String },

    #[error("Unknown aggregation '{0}'")]
    UnknownAggregation(String),

    #[error("Column '{column}' is not allowed in filters{}", .table.map(|t| format!(" on table '{}'", t)).unwrap_or_default())]
    UnknownColumn {
        column: String,
        /// Set when the column is globally filterable but absent from this table.
        table: Option<Table>,
    },

    #[error("Unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("between_datetime on '{column}' requires value2")]
    MissingSecondValue { column: String },

    #[error("{op} is only applicable to datetime columns, got '{column}'")]
    InvalidColumnForOperator { column: String, op: ConditionOp },

    #[error("Invalid ISO-8601 datetime for '{column}': {value}")]
    InvalidDatetime { column: String, value: String },

    #[error("Invalid calendar date for '{column}': {value}")]
    InvalidDate { column: String, value: String },

    #[error("Malformed specification: {0}")]
    Malformed(String),
}

pub type SpecResult<T> = Result<T, SpecError>;

// ============================================================================
// Options
// ============================================================================

/// How filter columns are checked against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnScope {
    /// Globally filterable and present on the queried table.
    #[default]
    PerTable,
    /// Globally filterable only. A column missing from the table then fails
    /// at execution instead of compilation.
    Global,
}

/// Options for compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub column_scope: ColumnScope,
}

impl CompileOptions {
    /// Set the filter column scope.
    pub fn with_column_scope(mut self, column_scope: ColumnScope) -> Self {
        self.column_scope = column_scope;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A statement ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The generated SQL string.
    pub sql: String,

    /// Values for the `:pN` placeholders in `sql`.
    pub params: Params,

    /// The query AST the text was rendered from.
    pub query: Query,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile with default options.
pub fn compile(spec: &Specification) -> SpecResult<CompiledQuery> {
    compile_with(spec, &CompileOptions::default())
}

/// Compile a specification into SQL text and its bind parameters.
pub fn compile_with(spec: &Specification, options: &CompileOptions) -> SpecResult<CompiledQuery> {
    let registry = SchemaRegistry::global();

    // Step 1: the aggregated field
    let field = registry
        .aggregable(spec.table, &spec.field)
        .ok_or_else(|| SpecError::UnknownField {
            table: spec.table,
            field: spec.field.clone(),
        })?;

    // Step 2: the select expression
    let select = match spec.aggregation {
        // The field is validated but COUNT(*) does not reference it.
        Aggregation::CountRows => count_star(),
        Aggregation::SumField => coalesce(vec![sum(col(field)), lit_int(0)]),
        Aggregation::CountDistinct => count_distinct(col(field)),
    };

    let mut query = Query::new()
        .select(SelectExpr::new(select).with_alias("value"))
        .from(spec.table.as_str());

    // Step 3: filters, in input order
    let mut params = ParamAllocator::default();
    for condition in &spec.filters {
        let column = resolve_column(registry, spec.table, condition, options.column_scope)?;
        query = query.filter(lower_condition(registry, column, condition, &mut params)?);
    }

    let sql = query.to_sql();
    let params = params.finish();
    tracing::debug!(sql = %sql, params = params.len(), "compiled specification");

    Ok(CompiledQuery { sql, params, query })
}

fn resolve_column(
    registry: &SchemaRegistry,
    table: Table,
    condition: &Condition,
    scope: ColumnScope,
) -> SpecResult<&'static str> {
    let column = registry
        .filterable(&condition.column)
        .ok_or_else(|| SpecError::UnknownColumn {
            column: condition.column.clone(),
            table: None,
        })?;

    match scope {
        ColumnScope::PerTable if !registry.has_column(table, column) => {
            Err(SpecError::UnknownColumn {
                column: condition.column.clone(),
                table: Some(table),
            })
        }
        _ => Ok(column),
    }
}

fn lower_condition(
    registry: &SchemaRegistry,
    column: &'static str,
    condition: &Condition,
    params: &mut ParamAllocator,
) -> SpecResult<Expr> {
    match condition.op {
        ConditionOp::Eq => {
            let p = params.bind(verbatim(&condition.value));
            Ok(col(column).eq(param(&p)))
        }

        ConditionOp::Gt => {
            let p = params.bind(verbatim(&condition.value));
            Ok(col(column).gt(param(&p)))
        }

        ConditionOp::BetweenDatetime => {
            let end = condition
                .value2
                .as_ref()
                .ok_or_else(|| SpecError::MissingSecondValue {
                    column: condition.column.clone(),
                })?;
            let start = parse_instant(&condition.value)
                .ok_or_else(|| invalid_datetime(condition, &condition.value))?;
            let end = parse_instant(end).ok_or_else(|| invalid_datetime(condition, end))?;
            Ok(half_open_range(column, start, end, params))
        }

        ConditionOp::DateEq => {
            if !registry.is_temporal(column) {
                return Err(SpecError::InvalidColumnForOperator {
                    column: condition.column.clone(),
                    op: condition.op,
                });
            }
            let invalid = || SpecError::InvalidDate {
                column: condition.column.clone(),
                value: condition.value.to_string(),
            };
            let start = parse_calendar_date(&condition.value)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .ok_or_else(invalid)?
                .and_utc();
            let end = start
                .checked_add_signed(Duration::days(1))
                .ok_or_else(invalid)?;
            Ok(half_open_range(column, start, end, params))
        }
    }
}

/// `column >= :start AND column < :end`
fn half_open_range(
    column: &'static str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    params: &mut ParamAllocator,
) -> Expr {
    let lo = params.bind(ParamValue::Timestamp(start));
    let hi = params.bind(ParamValue::Timestamp(end));
    col(column).gte(param(&lo)).and(col(column).lt(param(&hi)))
}

fn verbatim(value: &ConditionValue) -> ParamValue {
    match value {
        ConditionValue::Int(n) => ParamValue::Int(*n),
        ConditionValue::Text(s) => ParamValue::Text(s.clone()),
    }
}

fn invalid_datetime(condition: &Condition, value: &ConditionValue) -> SpecError {
    SpecError::InvalidDatetime {
        column: condition.column.clone(),
        value: value.to_string(),
    }
}

/// Hands out `p0`, `p1`, ... in binding order.
#[derive(Default)]
struct ParamAllocator {
    params: Params,
}

impl ParamAllocator {
    fn bind(&mut self, value: ParamValue) -> String {
        let name = param_name(self.params.len());
        self.params.insert(name.clone(), value);
        name
    }

    fn finish(self) -> Params {
        self.params
    }
}

// ============================================================================
// Value parsing
// ============================================================================

/// Interpret a filter value as an instant. Integers are never instants.
pub fn parse_instant(value: &ConditionValue) -> Option<DateTime<Utc>> {
    match value {
        ConditionValue::Text(s) => parse_iso_instant(s),
        ConditionValue::Int(_) => None,
    }
}

/// Interpret a filter value as a calendar day.
pub fn parse_calendar_date(value: &ConditionValue) -> Option<NaiveDate> {
    match value {
        ConditionValue::Text(s) => parse_iso_date(s),
        ConditionValue::Int(_) => None,
    }
}

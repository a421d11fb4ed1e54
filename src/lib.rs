//! # clipcount
//!
//! Answers analytics questions about a video-metrics dataset with a single
//! number.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Question (free text)  or  Specification JSON      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [nl::SpecProducer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Specification (table, aggregation, field, filters)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile, against schema::SchemaRegistry]
//! ┌─────────────────────────────────────────────────────────┐
//! │        CompiledQuery (SQL text + named parameters)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [exec::Executor, deadline + cancellation]
//! ┌─────────────────────────────────────────────────────────┐
//! │                         i64                              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`service::Analytics`] wires the stages together; [`store`] creates and
//! fills the SQLite database the queries run against.

pub mod compile;
pub mod config;
pub mod exec;
pub mod nl;
pub mod schema;
pub mod service;
pub mod spec;
pub mod sql;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        compile, compile_with, ColumnScope, CompileOptions, CompiledQuery, SpecError, SpecResult,
    };
    pub use crate::config::{Settings, SettingsError};
    pub use crate::exec::{Database, ExecError, ExecResult, Executor};
    pub use crate::nl::{OpenAiSpecProducer, ProduceError, SpecProducer};
    pub use crate::schema::{SchemaRegistry, Table};
    pub use crate::service::{Analytics, QueryError, QueryResult};
    pub use crate::spec::{Aggregation, Condition, ConditionOp, ConditionValue, Specification};
    pub use crate::sql::{ParamValue, Params};
    pub use crate::store::{create_schema, load_json, LoadStats, StoreError};
}

//! SQL generation module.
//!
//! A small type-safe builder for the one statement shape the compiler emits:
//!
//! - [`query`] - the `SELECT <aggregate> AS value FROM <table> [WHERE ...];` builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`params`] - Values bound to named placeholders

pub mod expr;
pub mod params;
pub mod query;
pub mod token;


pub use expr::{
    coalesce, col, count_distinct, count_star, lit_int, param, sum, BinaryOperator, Expr, ExprExt,
};
pub use params::{named_bindings, param_name, ParamValue, Params};
pub use query::{Query, SelectExpr};
pub use token::{Token, TokenStream};

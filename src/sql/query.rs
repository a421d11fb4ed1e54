//! Query builder - a single-aggregate `SELECT` with a conjunctive filter list.

use super::expr::Expr;
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.expr.to_tokens();
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Query
// =============================================================================

/// A `SELECT <expr> FROM <table> [WHERE <a> AND <b> ...];` statement.
///
/// Filters are kept in insertion order so identical builders always
/// serialize to identical text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct Query {
    pub select: Option<SelectExpr>,
    pub from: Option<String>,
    pub filters: Vec<Expr>,
}

impl Query {
    pub fn new() -> Self {
        Self {
            select: None,
            from: None,
            filters: Vec::new(),
        }
    }

    pub fn select(mut self, expr: impl Into<SelectExpr>) -> Self {
        self.select = Some(expr.into());
        self
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(table.into());
        self
    }

    /// Add a filter, AND-ed with any existing ones.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filters.push(expr);
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        match &self.select {
            Some(item) => ts.append(&item.to_tokens()),
            None => ts.push(Token::Star),
        };

        if let Some(table) = &self.from {
            ts.space()
                .push(Token::From)
                .space()
                .push(Token::Ident(table.clone()));
        }

        if !self.filters.is_empty() {
            ts.space().push(Token::Where).space();
            for (i, filter) in self.filters.iter().enumerate() {
                if i > 0 {
                    ts.space().push(Token::And).space();
                }
                ts.append(&filter.to_tokens());
            }
        }

        ts.push(Token::Semicolon);
        ts
    }

    /// Render the statement as SQL text.
    pub fn to_sql(&self) -> String {
        self.to_tokens().serialize()
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

//! Statement execution and result normalization.
//!
//! The executor runs exactly one compiled, read-only statement on a session
//! it owns for the duration of the call, reads at most one row and turns the
//! single column into an `i64`:
//!
//! ```text
//! no row | NULL  → 0
//! INTEGER       → as is
//! REAL          → truncated toward zero
//! TEXT decimal  → truncated toward zero
//! ```
//!
//! There is no retry. A deadline and a [`CancellationToken`] both interrupt
//! the running SQLite statement.

mod session;

pub use session::Database;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::{ToSql, Value};
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use crate::compile::CompiledQuery;
use crate::sql::named_bindings;

/// Errors raised while executing a compiled statement.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Query execution failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Refusing to run a statement that writes: {0}")]
    NotReadOnly(String),

    #[error("Query exceeded its deadline of {0:?}")]
    Timeout(Duration),

    #[error("Query was cancelled")]
    Cancelled,

    #[error("Aggregate returned a non-numeric value: {0}")]
    NonNumeric(String),

    #[error("Aggregate value does not fit in 64 bits: {0}")]
    OutOfRange(String),

    #[error("Query task failed: {0}")]
    Join(String),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Virtual machine steps between checks of the interrupt flag.
const PROGRESS_OPS: i32 = 1000;

/// Runs compiled statements with an optional per-request deadline.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt statements that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute on a blocking thread, racing the deadline and `cancel`.
    ///
    /// The session is moved into the worker and dropped when the statement
    /// finishes or is interrupted.
    pub async fn execute(
        &self,
        session: Connection,
        compiled: &CompiledQuery,
        cancel: &CancellationToken,
    ) -> ExecResult<i64> {
        // sqlite3_interrupt is a no-op before the statement starts; the
        // progress handler covers that window.
        let interrupt = session.get_interrupt_handle();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        session.progress_handler(PROGRESS_OPS, Some(move || flag.load(Ordering::Relaxed)));

        let compiled = compiled.clone();
        let mut task = tokio::task::spawn_blocking(move || execute_blocking(&session, &compiled));

        let limit = self.timeout;
        let deadline = async move {
            match limit {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            joined = &mut task => joined.map_err(|e| ExecError::Join(e.to_string()))?,
            _ = deadline => {
                stop.store(true, Ordering::Relaxed);
                interrupt.interrupt();
                let limit = limit.unwrap_or_default();
                tracing::warn!(timeout = ?limit, "query deadline exceeded, interrupting");
                Err(ExecError::Timeout(limit))
            }
            _ = cancel.cancelled() => {
                stop.store(true, Ordering::Relaxed);
                interrupt.interrupt();
                tracing::warn!("query cancelled, interrupting");
                Err(ExecError::Cancelled)
            }
        }
    }
}

/// Execute synchronously on a borrowed connection, without a deadline.
pub fn execute_blocking(conn: &Connection, compiled: &CompiledQuery) -> ExecResult<i64> {
    let mut stmt = conn.prepare(&compiled.sql)?;
    if !stmt.readonly() {
        return Err(ExecError::NotReadOnly(compiled.sql.clone()));
    }

    let bindings = named_bindings(&compiled.params);
    let named: Vec<(&str, &dyn ToSql)> = bindings
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();

    let mut rows = stmt.query(named.as_slice())?;
    let value = match rows.next()? {
        Some(row) => row.get::<_, Value>(0)?,
        None => Value::Null,
    };
    normalize(value)
}

/// Convert the aggregate column to an integer, treating NULL as zero.
pub fn normalize(value: Value) -> ExecResult<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Integer(n) => Ok(n),
        Value::Real(f) => truncate_real(f),
        Value::Text(s) => parse_decimal(&s),
        Value::Blob(b) => Err(ExecError::NonNumeric(format!("<blob of {} bytes>", b.len()))),
    }
}

fn truncate_real(f: f64) -> ExecResult<i64> {
    let t = f.trunc();
    // i64::MAX is not representable as f64; 2^63 is the first value out of range.
    if !t.is_finite() || t < i64::MIN as f64 || t >= 9_223_372_036_854_775_808.0 {
        return Err(ExecError::OutOfRange(f.to_string()));
    }
    Ok(t as i64)
}

/// Truncate a decimal string such as `"1234.50"` or `"-7.9"` toward zero.
fn parse_decimal(s: &str) -> ExecResult<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Ok(n);
    }

    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    let digits = int_part.trim_start_matches(['+', '-']);
    let is_decimal = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());

    if is_decimal {
        return match int_part.parse::<i64>() {
            Ok(n) => Ok(n),
            Err(_) => Err(ExecError::OutOfRange(s.to_string())),
        };
    }

    match s.parse::<f64>() {
        Ok(f) => truncate_real(f),
        Err(_) => Err(ExecError::NonNumeric(s.to_string())),
    }
}

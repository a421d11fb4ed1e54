//! Request facade: specification or question in, one number out.
//!
//! ```text
//! text ──SpecProducer──▶ Specification ──compile──▶ CompiledQuery ──Executor──▶ i64
//! ```
//!
//! Every request opens its own read-only session, so one `Analytics` value
//! can serve many concurrent requests.

use tokio_util::sync::CancellationToken;

use crate::compile::{compile_with, CompileOptions, SpecError};
use crate::config::{Settings, SettingsError};
use crate::exec::{Database, ExecError, Executor};
use crate::nl::{ProduceError, SpecProducer};
use crate::spec::Specification;

/// Shown to end users whatever went wrong.
pub const USER_ERROR_MESSAGE: &str =
    "Could not process the request. Try asking more simply or in other words.";

/// Any failure of a request.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Execution(#[from] ExecError),

    #[error(transparent)]
    Producer(#[from] ProduceError),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// The single message an end user sees. The specific kind is for logs.
    pub fn user_message(&self) -> &'static str {
        USER_ERROR_MESSAGE
    }

    /// Whether the failure was a deadline or cancellation, not a defect.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            QueryError::Execution(ExecError::Timeout(_) | ExecError::Cancelled)
        )
    }
}

/// Compiles and executes specifications against one store.
#[derive(Debug, Clone)]
pub struct Analytics {
    database: Database,
    executor: Executor,
    options: CompileOptions,
}

impl Analytics {
    pub fn new(database: Database, executor: Executor, options: CompileOptions) -> Self {
        Self {
            database,
            executor,
            options,
        }
    }

    /// Build from the `[database]` and `[compiler]` sections.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let database = Database::new(settings.database.resolved_path()?);
        let executor = match settings.database.timeout()? {
            Some(timeout) => Executor::new().with_timeout(timeout),
            None => Executor::new(),
        };
        Ok(Self::new(database, executor, settings.compiler.options()))
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Answer one specification.
    pub async fn answer_spec(&self, spec: &Specification) -> QueryResult<i64> {
        self.answer_spec_with_cancel(spec, &CancellationToken::new())
            .await
    }

    /// Answer one specification, giving up when `cancel` fires.
    #[tracing::instrument(
        name = "answer_spec",
        skip_all,
        fields(table = %spec.table, aggregation = %spec.aggregation, filters = spec.filters.len())
    )]
    pub async fn answer_spec_with_cancel(
        &self,
        spec: &Specification,
        cancel: &CancellationToken,
    ) -> QueryResult<i64> {
        let compiled = compile_with(spec, &self.options)?;
        let session = self.database.open_session().map_err(ExecError::from)?;
        let value = self.executor.execute(session, &compiled, cancel).await?;
        tracing::debug!(value, "answered");
        Ok(value)
    }

    /// Turn a question into a specification with `producer`, then answer it.
    #[tracing::instrument(name = "answer_text", skip_all)]
    pub async fn answer_text(&self, producer: &dyn SpecProducer, text: &str) -> QueryResult<i64> {
        let spec = producer.produce(text).await?;
        self.answer_spec(&spec).await
    }
}

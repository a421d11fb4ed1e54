//! Natural-language front end.
//!
//! A [`SpecProducer`] turns a question into a [`Specification`]. The only
//! shipped producer asks an OpenAI-compatible chat endpoint; tests and
//! other front ends implement the trait directly.

mod openai;
mod prompt;

pub use openai::{OpenAiSpecProducer, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompt::SYSTEM_PROMPT;

use async_trait::async_trait;

use crate::compile::SpecError;
use crate::spec::Specification;

/// Errors raised while producing a specification.
#[derive(Debug, thiserror::Error)]
pub enum ProduceError {
    #[error("Language model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language model returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Language model returned no content")]
    EmptyResponse,

    #[error("Language model returned an invalid specification: {0}")]
    Spec(#[from] SpecError),
}

pub type ProduceResult<T> = Result<T, ProduceError>;

/// Translates free text into a query specification.
#[async_trait]
pub trait SpecProducer: Send + Sync {
    async fn produce(&self, text: &str) -> ProduceResult<Specification>;
}

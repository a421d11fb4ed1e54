//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ProduceError, ProduceResult, SpecProducer, SYSTEM_PROMPT};
use crate::spec::Specification;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Asks a chat model for a specification document and parses the reply.
#[derive(Debug, Clone)]
pub struct OpenAiSpecProducer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiSpecProducer {
    pub fn new(api_key: impl Into<String>) -> ProduceResult<Self> {
        Self::with_timeout(api_key, None)
    }

    /// Build a producer whose HTTP requests give up after `timeout`.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProduceResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": text},
            ]
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// First choice's message text, if it has any.
fn first_content(response: ChatResponse) -> ProduceResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProduceError::EmptyResponse)
}

#[async_trait]
impl SpecProducer for OpenAiSpecProducer {
    async fn produce(&self, text: &str) -> ProduceResult<Specification> {
        tracing::debug!(model = %self.model, "requesting specification");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProduceError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let content = first_content(response.json::<ChatResponse>().await?)?;
        tracing::debug!(reply = %content, "model reply");
        Ok(Specification::from_json(&content)?)
    }
}

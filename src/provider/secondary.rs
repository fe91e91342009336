//! Secondary provider: a hosted text-generation inference endpoint.
//!
//! One `POST {url}` per chunk with `Authorization: Bearer <key>` and the
//! body `{"inputs": "<prompt>"}`. The default endpoint is HuggingFace's
//! hosted `google/flan-t5-large`; any endpoint speaking the same protocol
//! works. The response body is classified into a [`ProviderResponse`]
//! without assuming a shape.
//!
//! This provider is optional. [`HttpInferenceProvider::from_config`] returns
//! `None` when no key is configured, which the orchestrator reports as
//! [`ChunkError::SecondaryNotConfigured`] rather than as a call failure.

use super::{ProviderResponse, QuestionProvider};
use crate::config::QuizConfig;
use crate::error::{excerpt, ChunkError, QuizGenError};
use crate::pipeline::chunk::TextChunk;
use crate::prompts::question_prompt;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Name reported in diagnostics.
pub const SECONDARY_PROVIDER_NAME: &str = "huggingface";

pub struct HttpInferenceProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    questions_per_chunk: usize,
    timeout_secs: u64,
    excerpt_chars: usize,
}

impl HttpInferenceProvider {
    /// Build the secondary described by `config`, or `None` without a key.
    pub fn from_config(config: &QuizConfig) -> Result<Option<Self>, QuizGenError> {
        match config
            .secondary_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
        {
            Some(key) => Self::new(config.secondary_url.clone(), key, config).map(Some),
            None => Ok(None),
        }
    }

    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        config: &QuizConfig,
    ) -> Result<Self, QuizGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.secondary_timeout_secs))
            .build()
            .map_err(|e| QuizGenError::InvalidConfig(format!("secondary HTTP client: {e}")))?;
        Ok(Self::with_client(client, url, api_key, config))
    }

    /// Use a caller-supplied HTTP client (proxies, TLS roots, middleware).
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        config: &QuizConfig,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            questions_per_chunk: config.questions_per_chunk,
            timeout_secs: config.secondary_timeout_secs,
            excerpt_chars: config.diagnostic_excerpt_chars,
        }
    }

    fn call_failed(&self, detail: impl Into<String>) -> ChunkError {
        ChunkError::ProviderCallFailed {
            provider: SECONDARY_PROVIDER_NAME.to_string(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl QuestionProvider for HttpInferenceProvider {
    fn name(&self) -> &str {
        SECONDARY_PROVIDER_NAME
    }

    async fn generate(&self, chunk: &TextChunk) -> Result<ProviderResponse, ChunkError> {
        let payload = serde_json::json!({
            "inputs": question_prompt(chunk.content(), self.questions_per_chunk),
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.call_failed(format!("timed out after {}s", self.timeout_secs))
                } else {
                    self.call_failed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.call_failed(format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(self.call_failed(format!(
                "HTTP {}: {}",
                status,
                excerpt(&body, self.excerpt_chars)
            )));
        }

        debug!(
            "Chunk {}: {} returned {} bytes",
            chunk.index(),
            SECONDARY_PROVIDER_NAME,
            body.len()
        );
        Ok(ProviderResponse::from_body(&body))
    }
}

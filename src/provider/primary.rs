//! Primary provider: an `edgequake_llm` chat model.
//!
//! The underlying [`LLMProvider`] is created once, when the adapter is
//! built. A configured key for `gemini` builds the client from that key;
//! every other provider name goes through [`ProviderFactory`], which reads
//! its own environment variables. If that fails (unknown provider name, missing key for the
//! factory, bad model id) the failure is remembered and every subsequent
//! [`QuestionProvider::generate`] call reports it as
//! [`ChunkError::ProviderUnavailable`] without trying to re-initialise, so
//! each chunk goes straight to the fallback.

use super::{ProviderResponse, QuestionProvider};
use crate::config::QuizConfig;
use crate::error::ChunkError;
use crate::pipeline::chunk::TextChunk;
use crate::prompts::question_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, GeminiProvider, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// [`QuestionProvider`] backed by an `edgequake_llm` chat model.
pub struct LlmQuestionProvider {
    name: String,
    llm: Result<Arc<dyn LLMProvider>, String>,
    questions_per_chunk: usize,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl LlmQuestionProvider {
    /// Wrap an already-constructed LLM provider.
    pub fn new(name: impl Into<String>, llm: Arc<dyn LLMProvider>, config: &QuizConfig) -> Self {
        Self::with_llm(name.into(), Ok(llm), config)
    }

    /// Build the primary described by `config`.
    ///
    /// Uses `config.primary_llm` when set. Otherwise a `gemini` primary with
    /// `primary_api_key` set is built from that key, and anything else is
    /// asked of [`ProviderFactory`] by `primary_provider` / `primary_model`.
    /// Never fails: an initialisation error is stored and surfaced per call.
    pub fn from_config(config: &QuizConfig) -> Self {
        let name = config.primary_provider.clone();
        if let Some(ref llm) = config.primary_llm {
            return Self::with_llm(name, Ok(Arc::clone(llm)), config);
        }

        let key = config
            .primary_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = key {
            if config.primary_provider.eq_ignore_ascii_case("gemini") {
                let llm = GeminiProvider::new(key).with_model(config.primary_model.as_str());
                return Self::with_llm(name, Ok(Arc::new(llm)), config);
            }
        }

        let llm = ProviderFactory::create_llm_provider(&config.primary_provider, &config.primary_model)
            .map_err(|e| {
                let reason = format!(
                    "failed to initialise '{}' with model '{}': {e}",
                    config.primary_provider, config.primary_model
                );
                warn!("{}", reason);
                reason
            });
        Self::with_llm(name, llm, config)
    }

    /// An adapter whose client could not be created.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>, config: &QuizConfig) -> Self {
        Self::with_llm(name.into(), Err(reason.into()), config)
    }

    /// True if the underlying client initialised.
    pub fn is_ready(&self) -> bool {
        self.llm.is_ok()
    }

    fn with_llm(name: String, llm: Result<Arc<dyn LLMProvider>, String>, config: &QuizConfig) -> Self {
        Self {
            name,
            llm,
            questions_per_chunk: config.questions_per_chunk,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn unavailable_error(&self, detail: impl Into<String>) -> ChunkError {
        ChunkError::ProviderUnavailable {
            provider: self.name.clone(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl QuestionProvider for LlmQuestionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, chunk: &TextChunk) -> Result<ProviderResponse, ChunkError> {
        let llm = match &self.llm {
            Ok(llm) => llm,
            Err(reason) => return Err(self.unavailable_error(reason.clone())),
        };

        let messages = vec![ChatMessage::user(question_prompt(
            chunk.content(),
            self.questions_per_chunk,
        ))];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, llm.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "Chunk {}: {} answered in {:?} ({} in / {} out tokens)",
                    chunk.index(),
                    self.name,
                    start.elapsed(),
                    response.prompt_tokens,
                    response.completion_tokens
                );
                Ok(ProviderResponse::PlainText(response.content))
            }
            Ok(Err(e)) => Err(self.unavailable_error(e.to_string())),
            Err(_) => Err(self.unavailable_error(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

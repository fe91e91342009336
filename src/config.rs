//! Configuration types for quiz generation.
//!
//! All generation behaviour is controlled through [`QuizConfig`], built via
//! its [`QuizConfigBuilder`]. Credentials normally come from the environment
//! ([`QuizConfigBuilder::with_env`]); everything else has a default.

use crate::error::QuizGenError;
use crate::pipeline::chunk::DEFAULT_CHUNK_SIZE;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_QUESTIONS_PER_CHUNK;
use crate::provider::QuestionProvider;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the primary provider key.
pub const PRIMARY_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable holding the optional secondary provider key.
pub const SECONDARY_KEY_ENV: &str = "HF_API_KEY";
/// Overrides [`QuizConfig::primary_provider`].
pub const PRIMARY_PROVIDER_ENV: &str = "QUIZGEN_PRIMARY_PROVIDER";
/// Overrides [`QuizConfig::primary_model`].
pub const PRIMARY_MODEL_ENV: &str = "QUIZGEN_PRIMARY_MODEL";
/// Overrides [`QuizConfig::secondary_url`].
pub const SECONDARY_URL_ENV: &str = "QUIZGEN_SECONDARY_URL";

pub const DEFAULT_PRIMARY_PROVIDER: &str = "gemini";
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SECONDARY_URL: &str =
    "https://api-inference.huggingface.co/models/google/flan-t5-large";
/// Texts shorter than this (in characters) are rejected as unreadable.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 500;

/// Configuration for a quiz-generation run.
///
/// # Example
/// ```rust
/// use edgequake_quizgen::{AnswerCheck, QuizConfig};
///
/// let config = QuizConfig::builder()
///     .chunk_size(2000)
///     .questions_per_chunk(5)
///     .primary_api_key("test-key")
///     .answer_check(AnswerCheck::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 2000);
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// Maximum characters per chunk. Default: 3000.
    pub chunk_size: usize,

    /// Minimum characters of extracted text. Default: 500.
    pub min_text_chars: usize,

    /// Questions requested from the provider per chunk. Default: 3.
    pub questions_per_chunk: usize,

    /// `edgequake_llm` provider name for the primary. Default: `"gemini"`.
    pub primary_provider: String,

    /// Model for the primary provider. Default: `"gemini-1.5-flash"`.
    pub primary_model: String,

    /// Primary credential. Required unless a pre-built primary is supplied.
    /// Used directly for `gemini`; other providers read their own
    /// environment variables.
    pub primary_api_key: Option<String>,

    /// Pre-built LLM provider used as the primary. Takes precedence over
    /// `primary_provider` / `primary_model`.
    pub primary_llm: Option<Arc<dyn LLMProvider>>,

    /// Pre-built primary adapter. Takes precedence over everything else.
    pub primary: Option<Arc<dyn QuestionProvider>>,

    /// Secondary credential. `None` means "no fallback".
    pub secondary_api_key: Option<String>,

    /// Secondary inference endpoint.
    pub secondary_url: String,

    /// Pre-built secondary adapter. Takes precedence over `secondary_api_key`.
    pub secondary: Option<Arc<dyn QuestionProvider>>,

    /// Deadline for one secondary HTTP call, in seconds. Default: 60.
    pub secondary_timeout_secs: u64,

    /// Deadline for one primary call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Sampling temperature for the primary. Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens the primary may generate per chunk. Default: 2048.
    pub max_tokens: usize,

    /// Chunks processed at once. Default: 1 (strictly sequential).
    pub concurrency: usize,

    /// Post-parse policy for `correct_answer`. Default: [`AnswerCheck::Warn`].
    pub answer_check: AnswerCheck,

    /// Longest raw-output excerpt carried in diagnostics. Default: 200.
    pub diagnostic_excerpt_chars: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-chunk progress and diagnostics.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            questions_per_chunk: DEFAULT_QUESTIONS_PER_CHUNK,
            primary_provider: DEFAULT_PRIMARY_PROVIDER.to_string(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            primary_api_key: None,
            primary_llm: None,
            primary: None,
            secondary_api_key: None,
            secondary_url: DEFAULT_SECONDARY_URL.to_string(),
            secondary: None,
            secondary_timeout_secs: 60,
            api_timeout_secs: 60,
            temperature: 0.4,
            max_tokens: 2048,
            concurrency: 1,
            answer_check: AnswerCheck::default(),
            diagnostic_excerpt_chars: 200,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("chunk_size", &self.chunk_size)
            .field("min_text_chars", &self.min_text_chars)
            .field("questions_per_chunk", &self.questions_per_chunk)
            .field("primary_provider", &self.primary_provider)
            .field("primary_model", &self.primary_model)
            .field("primary_api_key", &self.primary_api_key.as_ref().map(|_| "<redacted>"))
            .field("primary_llm", &self.primary_llm.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("primary", &self.primary.as_ref().map(|p| p.name().to_string()))
            .field("secondary_api_key", &self.secondary_api_key.as_ref().map(|_| "<redacted>"))
            .field("secondary_url", &self.secondary_url)
            .field("secondary", &self.secondary.as_ref().map(|p| p.name().to_string()))
            .field("secondary_timeout_secs", &self.secondary_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("concurrency", &self.concurrency)
            .field("answer_check", &self.answer_check)
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus credentials and overrides read from the environment.
    pub fn from_env() -> Result<Self, QuizGenError> {
        Self::builder().with_env().build()
    }

    /// True when a fallback provider can be used.
    pub fn secondary_configured(&self) -> bool {
        self.secondary.is_some() || non_empty(self.secondary_api_key.as_deref()).is_some()
    }

    /// Fail fast when no primary can possibly be built.
    ///
    /// A pre-built primary (adapter or LLM provider) needs no key.
    pub fn require_primary(&self) -> Result<(), QuizGenError> {
        if self.primary.is_some() || self.primary_llm.is_some() {
            return Ok(());
        }
        match non_empty(self.primary_api_key.as_deref()) {
            Some(_) => Ok(()),
            None => Err(QuizGenError::MissingPrimaryKey {
                env_var: PRIMARY_KEY_ENV.to_string(),
            }),
        }
    }
}

/// Builder for [`QuizConfig`].
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl fmt::Debug for QuizConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl QuizConfigBuilder {
    /// Fill credentials and provider overrides from the environment.
    ///
    /// Empty variables are treated as unset.
    pub fn with_env(mut self) -> Self {
        if let Some(key) = env_var(PRIMARY_KEY_ENV) {
            self.config.primary_api_key = Some(key);
        }
        if let Some(key) = env_var(SECONDARY_KEY_ENV) {
            self.config.secondary_api_key = Some(key);
        }
        if let Some(provider) = env_var(PRIMARY_PROVIDER_ENV) {
            self.config.primary_provider = provider;
        }
        if let Some(model) = env_var(PRIMARY_MODEL_ENV) {
            self.config.primary_model = model;
        }
        if let Some(url) = env_var(SECONDARY_URL_ENV) {
            self.config.secondary_url = url;
        }
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn questions_per_chunk(mut self, n: usize) -> Self {
        self.config.questions_per_chunk = n.max(1);
        self
    }

    pub fn primary_provider(mut self, name: impl Into<String>) -> Self {
        self.config.primary_provider = name.into();
        self
    }

    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.config.primary_model = model.into();
        self
    }

    /// Key for a `gemini` primary; builds the client without reading the
    /// environment.
    pub fn primary_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.primary_api_key = Some(key.into());
        self
    }

    pub fn primary_llm(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.primary_llm = Some(provider);
        self
    }

    pub fn primary(mut self, provider: Arc<dyn QuestionProvider>) -> Self {
        self.config.primary = Some(provider);
        self
    }

    pub fn secondary_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.secondary_api_key = Some(key.into());
        self
    }

    pub fn secondary_url(mut self, url: impl Into<String>) -> Self {
        self.config.secondary_url = url.into();
        self
    }

    pub fn secondary(mut self, provider: Arc<dyn QuestionProvider>) -> Self {
        self.config.secondary = Some(provider);
        self
    }

    pub fn secondary_timeout_secs(mut self, secs: u64) -> Self {
        self.config.secondary_timeout_secs = secs.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn answer_check(mut self, check: AnswerCheck) -> Self {
        self.config.answer_check = check;
        self
    }

    pub fn diagnostic_excerpt_chars(mut self, n: usize) -> Self {
        self.config.diagnostic_excerpt_chars = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Credentials are not checked here; see [`QuizConfig::require_primary`].
    pub fn build(self) -> Result<QuizConfig, QuizGenError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(QuizGenError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(QuizGenError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(QuizGenError::InvalidConfig(
                "Max tokens must be ≥ 1".into(),
            ));
        }
        if c.primary_llm.is_none() && c.primary.is_none() && c.primary_provider.trim().is_empty() {
            return Err(QuizGenError::InvalidConfig(
                "Primary provider name must not be empty".into(),
            ));
        }
        if c.secondary.is_none()
            && c.secondary_api_key.is_some()
            && !(c.secondary_url.starts_with("http://") || c.secondary_url.starts_with("https://"))
        {
            return Err(QuizGenError::InvalidConfig(format!(
                "Secondary URL must be http(s), got '{}'",
                c.secondary_url
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What to do when a parsed `correct_answer` is not one of its `options`.
///
/// Providers do not reliably honour the answer-in-options rule, and a
/// degraded record has no options at all, so the policy is a caller choice:
///
/// | Policy | Mismatched records |
/// |--------|--------------------|
/// | `Off`    | kept silently, fields only trimmed |
/// | `Warn`   | kept, one diagnostic per chunk (default) |
/// | `Strict` | dropped and counted as rejected |
///
/// `Warn` and `Strict` first map letter answers such as `"B"` or `"c)"` to
/// the option at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerCheck {
    Off,
    #[default]
    Warn,
    Strict,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.trim().is_empty())
}

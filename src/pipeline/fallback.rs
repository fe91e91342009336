//! The fallback orchestrator: Primary → Secondary, chunk by chunk.
//!
//! ## Per-chunk state machine
//!
//! ```text
//!            ┌────────────┐  ok    ┌──────────┐
//!  chunk ──▶ │ TryPrimary │ ─────▶ │ Succeeded│
//!            └─────┬──────┘        └──────────┘
//!                  │ adapter error / unparseable
//!                  ▼
//!            ┌──────────────┐  ok  ┌──────────┐
//!            │ TrySecondary │ ───▶ │ Succeeded│ (fallback)
//!            └─────┬────────┘      └──────────┘
//!                  │ not configured / error / unparseable
//!                  ▼
//!            ┌──────────┐
//!            │  Failed  │  (contributes zero questions)
//!            └──────────┘
//! ```
//!
//! A chunk failure is recorded in its [`ChunkResult`] and never stops the
//! run. With `concurrency > 1` several chunks are in flight at once, but
//! each chunk still walks this machine on its own and results are re-sorted
//! by index, so the aggregate order is identical to a sequential run.

use crate::config::{AnswerCheck, QuizConfig};
use crate::error::{ChunkError, QuizGenError};
use crate::output::{ChunkResult, GenerationOutput};
use crate::pipeline::chunk::TextChunk;
use crate::pipeline::parse::parse_questions;
use crate::pipeline::validate::{check_answers, CheckedQuestions};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::provider::{HttpInferenceProvider, LlmQuestionProvider, QuestionProvider};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs chunks through the primary and, on failure, the secondary provider.
pub struct FallbackOrchestrator {
    primary: Arc<dyn QuestionProvider>,
    secondary: Option<Arc<dyn QuestionProvider>>,
    answer_check: AnswerCheck,
    excerpt_chars: usize,
    concurrency: usize,
    callback: ProgressCallback,
}

impl FallbackOrchestrator {
    pub fn new(
        primary: Arc<dyn QuestionProvider>,
        secondary: Option<Arc<dyn QuestionProvider>>,
    ) -> Self {
        let defaults = QuizConfig::default();
        Self {
            primary,
            secondary,
            answer_check: defaults.answer_check,
            excerpt_chars: defaults.diagnostic_excerpt_chars,
            concurrency: 1,
            callback: Arc::new(NoopProgressCallback),
        }
    }

    /// Resolve both providers from `config`.
    ///
    /// Fails only when no primary can be built at all (missing key).
    /// A primary whose client fails to initialise is still returned; it
    /// reports itself unavailable on every chunk.
    pub fn from_config(config: &QuizConfig) -> Result<Self, QuizGenError> {
        config.require_primary()?;

        let primary: Arc<dyn QuestionProvider> = match config.primary {
            Some(ref p) => Arc::clone(p),
            None => Arc::new(LlmQuestionProvider::from_config(config)),
        };

        let secondary: Option<Arc<dyn QuestionProvider>> = match config.secondary {
            Some(ref s) => Some(Arc::clone(s)),
            None => HttpInferenceProvider::from_config(config)?
                .map(|p| Arc::new(p) as Arc<dyn QuestionProvider>),
        };

        if secondary.is_none() {
            debug!("No secondary provider configured; failed chunks will be skipped");
        }

        let mut orchestrator = Self::new(primary, secondary)
            .with_answer_check(config.answer_check)
            .with_excerpt_chars(config.diagnostic_excerpt_chars)
            .with_concurrency(config.concurrency);
        if let Some(ref cb) = config.progress_callback {
            orchestrator = orchestrator.with_progress_callback(Arc::clone(cb));
        }
        Ok(orchestrator)
    }

    pub fn with_answer_check(mut self, check: AnswerCheck) -> Self {
        self.answer_check = check;
        self
    }

    pub fn with_excerpt_chars(mut self, n: usize) -> Self {
        self.excerpt_chars = n;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.callback = cb;
        self
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Generate questions for every chunk; never fails as a whole.
    pub async fn run(&self, chunks: Vec<TextChunk>) -> GenerationOutput {
        let start = Instant::now();
        let total = chunks.len();
        info!(
            "Generating questions for {} chunks (primary: {}, fallback: {}, concurrency: {})",
            total,
            self.primary.name(),
            self.secondary.as_ref().map(|s| s.name()).unwrap_or("none"),
            self.concurrency
        );
        self.callback.on_generation_start(total);

        let completed = AtomicUsize::new(0);
        let results: Vec<ChunkResult> = if self.concurrency <= 1 {
            let mut results = Vec::with_capacity(total);
            for chunk in &chunks {
                let result = self.process_chunk(chunk, total).await;
                self.report_progress(&completed, total);
                results.push(result);
            }
            results
        } else {
            let completed = &completed;
            stream::iter(chunks.iter().map(|chunk| async move {
                let result = self.process_chunk(chunk, total).await;
                self.report_progress(completed, total);
                result
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await
        };

        let output = GenerationOutput::from_chunks(results, start.elapsed().as_millis() as u64);
        info!(
            "Generation complete: {} questions, {}/{} chunks ok ({} via fallback), {}ms",
            output.stats.total_questions,
            output.stats.succeeded_chunks,
            output.stats.total_chunks,
            output.stats.fallback_chunks,
            output.stats.total_duration_ms
        );
        self.callback.on_generation_complete(
            output.stats.total_chunks,
            output.stats.succeeded_chunks,
            output.stats.total_questions,
        );
        output
    }

    /// Walk one chunk through Primary → Secondary.
    ///
    /// Always returns a `ChunkResult`; failures live in `result.failures`.
    pub async fn process_chunk(&self, chunk: &TextChunk, total: usize) -> ChunkResult {
        let start = Instant::now();
        let index = chunk.index();
        self.callback.on_chunk_start(index, total);

        let mut failures = Vec::new();

        let outcome = match self.attempt(self.primary.as_ref(), chunk).await {
            Ok(checked) => Some((self.primary.name(), checked)),
            Err(e) => {
                let next = self
                    .secondary
                    .as_ref()
                    .map(|s| format!("switching to {}", s.name()))
                    .unwrap_or_else(|| "no fallback available".to_string());
                self.diagnose(chunk, total, &format!("{e}; {next}"));
                failures.push(e);

                match self.secondary {
                    None => {
                        let e = ChunkError::SecondaryNotConfigured;
                        self.diagnose(chunk, total, "skipped: no fallback provider configured");
                        failures.push(e);
                        None
                    }
                    Some(ref secondary) => match self.attempt(secondary.as_ref(), chunk).await {
                        Ok(checked) => Some((secondary.name(), checked)),
                        Err(e) => {
                            self.diagnose(chunk, total, &format!("fallback also failed: {e}"));
                            failures.push(e);
                            None
                        }
                    },
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Some((provider, checked)) => {
                self.report_answer_check(chunk, total, provider, &checked);
                debug!(
                    "Chunk {}: {} questions from {} in {}ms",
                    index,
                    checked.records.len(),
                    provider,
                    duration_ms
                );
                self.callback
                    .on_chunk_complete(index, provider, checked.records.len());
                ChunkResult {
                    index,
                    questions: checked.records,
                    provider: Some(provider.to_string()),
                    failures,
                    rejected: checked.rejected,
                    duration_ms,
                }
            }
            None => {
                if let Some(last) = failures.last() {
                    self.callback.on_chunk_error(index, last);
                }
                ChunkResult {
                    index,
                    questions: Vec::new(),
                    provider: None,
                    failures,
                    rejected: 0,
                    duration_ms,
                }
            }
        }
    }

    /// One provider call followed by parsing and answer validation.
    async fn attempt(
        &self,
        provider: &dyn QuestionProvider,
        chunk: &TextChunk,
    ) -> Result<CheckedQuestions, ChunkError> {
        let response = provider.generate(chunk).await?;
        let raw = response.to_text();
        let records = parse_questions(&raw)
            .map_err(|_| ChunkError::unparseable(provider.name(), &raw, self.excerpt_chars))?;
        Ok(check_answers(records, self.answer_check))
    }

    fn report_answer_check(
        &self,
        chunk: &TextChunk,
        total: usize,
        provider: &str,
        checked: &CheckedQuestions,
    ) {
        if checked.mismatched == 0 {
            return;
        }
        let msg = match self.answer_check {
            AnswerCheck::Strict => format!(
                "rejected {} {} question(s) whose answer is not among the options",
                checked.rejected, provider
            ),
            _ => format!(
                "{} {} question(s) have an answer that is not among the options",
                checked.mismatched, provider
            ),
        };
        self.diagnose(chunk, total, &msg);
    }

    fn diagnose(&self, chunk: &TextChunk, total: usize, message: &str) {
        let message = format!("Chunk {}/{}: {}", chunk.index() + 1, total, message);
        warn!("{}", message);
        self.callback.on_diagnostic(&message);
    }

    pub(crate) fn callback(&self) -> &ProgressCallback {
        &self.callback
    }

    pub(crate) fn report_progress(&self, completed: &AtomicUsize, total: usize) {
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.callback.on_progress(done, total);
    }
}

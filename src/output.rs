//! Result types returned by the generation pipeline.
//!
//! [`GenerationOutput`] keeps both the flat, chunk-ordered question list
//! (what most callers render) and the per-chunk [`ChunkResult`]s (what a
//! caller needs to explain *why* a chunk contributed nothing).

use crate::error::{ChunkError, QuizGenError};
use serde::{Deserialize, Serialize};

/// One multiple-choice question.
///
/// Serialises to exactly the JSON shape the providers are asked to produce:
///
/// ```json
/// { "question": "…", "options": ["…", "…", "…", "…"], "correct_answer": "…" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
}

impl QuestionRecord {
    pub fn new(
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
        }
    }

    /// A record synthesised from text that was not a question object.
    pub fn degraded(raw: impl Into<String>) -> Self {
        Self {
            question: raw.into(),
            options: Vec::new(),
            correct_answer: String::new(),
        }
    }

    /// True when the record carries only a question text.
    pub fn is_degraded(&self) -> bool {
        self.options.is_empty() && self.correct_answer.is_empty()
    }

    /// True when `correct_answer` is one of `options`.
    pub fn answer_in_options(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

/// Outcome of one chunk after its full Primary → Secondary pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 0-based chunk index.
    pub index: usize,
    /// Questions contributed by this chunk (empty on failure).
    pub questions: Vec<QuestionRecord>,
    /// Name of the provider whose output was accepted; `None` if every
    /// attempt failed.
    pub provider: Option<String>,
    /// Every failed attempt, in the order it happened.
    pub failures: Vec<ChunkError>,
    /// Records dropped by [`crate::config::AnswerCheck::Strict`].
    pub rejected: usize,
    /// Wall-clock time for all attempts on this chunk.
    pub duration_ms: u64,
}

impl ChunkResult {
    pub fn is_success(&self) -> bool {
        self.provider.is_some()
    }

    /// Succeeded, but only after the primary failed.
    pub fn used_fallback(&self) -> bool {
        self.is_success() && !self.failures.is_empty()
    }

    /// The error that made this chunk fail (the last attempt's).
    pub fn error(&self) -> Option<&ChunkError> {
        if self.is_success() {
            None
        } else {
            self.failures.last()
        }
    }
}

/// Aggregate output of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// All questions in chunk order.
    pub questions: Vec<QuestionRecord>,
    /// Per-chunk results sorted by index.
    pub chunks: Vec<ChunkResult>,
    pub stats: GenerationStats,
}

impl GenerationOutput {
    /// Assemble the output from per-chunk results, sorting them by index.
    pub fn from_chunks(mut chunks: Vec<ChunkResult>, total_duration_ms: u64) -> Self {
        chunks.sort_by_key(|c| c.index);

        let questions: Vec<QuestionRecord> = chunks
            .iter()
            .flat_map(|c| c.questions.iter().cloned())
            .collect();

        let stats = GenerationStats {
            total_chunks: chunks.len(),
            succeeded_chunks: chunks.iter().filter(|c| c.is_success()).count(),
            fallback_chunks: chunks.iter().filter(|c| c.used_fallback()).count(),
            failed_chunks: chunks.iter().filter(|c| !c.is_success()).count(),
            total_questions: questions.len(),
            degraded_questions: questions.iter().filter(|q| q.is_degraded()).count(),
            rejected_questions: chunks.iter().map(|c| c.rejected).sum(),
            total_duration_ms,
        };

        Self {
            questions,
            chunks,
            stats,
        }
    }

    /// Treat any failed chunk as an error.
    pub fn into_result(self) -> Result<Self, QuizGenError> {
        if self.stats.failed_chunks > 0 {
            return Err(QuizGenError::PartialFailure {
                success: self.stats.succeeded_chunks,
                failed: self.stats.failed_chunks,
                total: self.stats.total_chunks,
            });
        }
        Ok(self)
    }

    /// The first `n` questions, for preview rendering.
    pub fn preview(&self, n: usize) -> &[QuestionRecord] {
        &self.questions[..n.min(self.questions.len())]
    }
}

/// Run-level counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_chunks: usize,
    pub succeeded_chunks: usize,
    /// Chunks rescued by the secondary provider.
    pub fallback_chunks: usize,
    pub failed_chunks: usize,
    pub total_questions: usize,
    pub degraded_questions: usize,
    pub rejected_questions: usize,
    pub total_duration_ms: u64,
}

//! # edgequake-quizgen
//!
//! Generate multiple-choice quiz questions from extracted document text
//! using an LLM, with a one-shot fallback to a hosted inference endpoint.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text (from a PDF extractor)
//!  │
//!  ├─ 1. Input     resolve file / URL / stdin, reject < 500 chars
//!  ├─ 2. Chunk     fixed 3000-character windows
//!  ├─ 3. Generate  per chunk: primary LLM ─(any failure)─▶ secondary endpoint
//!  ├─ 4. Parse     strict JSON, then regex recovery, then degraded records
//!  ├─ 5. Check     trim fields, resolve letter answers, flag mismatches
//!  └─ 6. Output    chunk-ordered questions + per-chunk diagnostics
//! ```
//!
//! A chunk that fails on both providers contributes zero questions; it
//! never aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_quizgen::{generate_from_input, QuizConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GEMINI_API_KEY is required, HF_API_KEY enables the fallback.
//!     let config = QuizConfig::from_env()?;
//!     let output = generate_from_input("lecture-notes.txt", &config).await?;
//!     for q in output.preview(5) {
//!         println!("{} -> {}", q.question, q.correct_answer);
//!     }
//!     eprintln!(
//!         "{} questions, {} chunks via fallback",
//!         output.stats.total_questions, output.stats.fallback_chunks
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `quizgen` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-quizgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnswerCheck, QuizConfig, QuizConfigBuilder};
pub use error::{ChunkError, QuizGenError};
pub use generate::{
    generate_from_input, generate_from_text, generate_questions, generate_sync, generate_to_file,
    write_questions,
};
pub use output::{ChunkResult, GenerationOutput, GenerationStats, QuestionRecord};
pub use pipeline::chunk::{chunk_text, TextChunk};
pub use pipeline::fallback::FallbackOrchestrator;
pub use pipeline::input::ExtractedText;
pub use pipeline::parse::{parse_questions, parse_response, ParseError};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use provider::{HttpInferenceProvider, LlmQuestionProvider, ProviderResponse, QuestionProvider};
pub use stream::{generate_stream, ChunkStream};

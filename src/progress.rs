//! Progress-callback trait for per-chunk generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::QuizConfigBuilder::progress_callback`] to receive events
//! as the orchestrator works through the chunks. The library never talks to
//! a terminal or UI directly; a progress bar, a web socket or a log sink are
//! all just implementations of this trait.
//!
//! # Example
//!
//! ```rust
//! use edgequake_quizgen::{GenerationProgressCallback, QuizConfig};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_progress(&self, completed: usize, total: usize) {
//!         eprintln!("{completed}/{total} chunks");
//!     }
//!     fn on_diagnostic(&self, message: &str) {
//!         eprintln!("warning: {message}");
//!     }
//! }
//!
//! let config = QuizConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ChunkError;
use std::sync::Arc;

/// Called by the orchestrator as it processes each chunk.
///
/// All methods have no-op defaults. With `concurrency > 1` the per-chunk
/// methods may be called from several tasks at once, so implementations must
/// guard shared state themselves.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the first chunk.
    fn on_generation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called before the primary provider is invoked for a chunk.
    ///
    /// * `chunk_index`: 0-based chunk index
    fn on_chunk_start(&self, chunk_index: usize, total_chunks: usize) {
        let _ = (chunk_index, total_chunks);
    }

    /// A human-readable note about a failed attempt or a suspicious result.
    fn on_diagnostic(&self, message: &str) {
        let _ = message;
    }

    /// Called when a chunk contributed questions.
    fn on_chunk_complete(&self, chunk_index: usize, provider: &str, question_count: usize) {
        let _ = (chunk_index, provider, question_count);
    }

    /// Called when every attempt for a chunk failed.
    fn on_chunk_error(&self, chunk_index: usize, error: &ChunkError) {
        let _ = (chunk_index, error);
    }

    /// Called after every chunk reaches a terminal state.
    ///
    /// `completed / total` is the progress fraction.
    fn on_progress(&self, completed: usize, total: usize) {
        let _ = (completed, total);
    }

    /// Called once after all chunks have been attempted.
    fn on_generation_complete(&self, total_chunks: usize, succeeded: usize, questions: usize) {
        let _ = (total_chunks, succeeded, questions);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::QuizConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

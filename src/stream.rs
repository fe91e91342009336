//! Streaming generation API: emit chunk results as they are ready.
//!
//! Unlike the eager [`crate::generate::generate_questions`], which returns
//! only after every chunk finishes, [`generate_stream`] yields one
//! [`ChunkResult`] per chunk. Results always arrive in chunk order; with
//! `concurrency > 1` later chunks are generated ahead and held back until
//! their predecessors are done.
//!
//! `on_generation_start` fires when the stream is created and
//! `on_generation_complete` fires as the last result is yielded, with the
//! same totals an eager run would report. A stream dropped early never
//! fires `on_generation_complete`.

use crate::config::QuizConfig;
use crate::error::QuizGenError;
use crate::output::ChunkResult;
use crate::pipeline::chunk::TextChunk;
use crate::pipeline::fallback::FallbackOrchestrator;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of chunk results.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;

/// Generate questions for `chunks`, streaming results in chunk order.
///
/// # Returns
/// - `Ok(ChunkStream)`, one item per chunk (failed chunks included)
/// - `Err(QuizGenError)`, configuration error before any call is made
pub fn generate_stream(
    chunks: Vec<TextChunk>,
    config: &QuizConfig,
) -> Result<ChunkStream, QuizGenError> {
    let orchestrator = Arc::new(FallbackOrchestrator::from_config(config)?);
    let total = chunks.len();
    let concurrency = orchestrator.concurrency();
    info!(
        "Starting streaming generation: {} chunks, concurrency {}",
        total, concurrency
    );

    let callback = Arc::clone(orchestrator.callback());
    callback.on_generation_start(total);
    if total == 0 {
        callback.on_generation_complete(0, 0, 0);
    }

    let completed = Arc::new(AtomicUsize::new(0));
    let s = stream::iter(chunks).map(move |chunk| {
        let orchestrator = Arc::clone(&orchestrator);
        let completed = Arc::clone(&completed);
        async move {
            let result = orchestrator.process_chunk(&chunk, total).await;
            orchestrator.report_progress(&completed, total);
            result
        }
    });

    let (mut seen, mut succeeded, mut questions) = (0usize, 0usize, 0usize);
    let s = s.buffered(concurrency).inspect(move |result| {
        seen += 1;
        succeeded += usize::from(result.is_success());
        questions += result.questions.len();
        if seen == total {
            info!(
                "Streaming generation complete: {} questions, {}/{} chunks ok",
                questions, succeeded, total
            );
            callback.on_generation_complete(total, succeeded, questions);
        }
    });

    Ok(Box::pin(s))
}

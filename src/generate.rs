//! Eager (whole-document) generation entry points.
//!
//! These wait for every chunk and return one [`GenerationOutput`]. Use
//! [`crate::stream::generate_stream`] to receive chunk results as they
//! complete instead.

use crate::config::QuizConfig;
use crate::error::QuizGenError;
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::chunk::{chunk_text, TextChunk};
use crate::pipeline::fallback::FallbackOrchestrator;
use crate::pipeline::input::{self, ensure_min_length};
use std::path::Path;
use tracing::{debug, info};

/// Generate questions for already-chunked text.
///
/// # Errors
/// Only configuration problems detected before any chunk is processed,
/// such as [`QuizGenError::MissingPrimaryKey`]. Per-chunk failures are
/// reported inside the returned output (see `output.stats.failed_chunks`).
pub async fn generate_questions(
    chunks: Vec<TextChunk>,
    config: &QuizConfig,
) -> Result<GenerationOutput, QuizGenError> {
    let orchestrator = FallbackOrchestrator::from_config(config)?;
    Ok(orchestrator.run(chunks).await)
}

/// Gate, chunk and generate questions for a block of extracted text.
pub async fn generate_from_text(
    text: &str,
    config: &QuizConfig,
) -> Result<GenerationOutput, QuizGenError> {
    ensure_min_length(text, config.min_text_chars)?;
    // Fail on a missing key before chunking.
    let orchestrator = FallbackOrchestrator::from_config(config)?;

    let chunks = chunk_text(text, config.chunk_size);
    debug!(
        "Split {} chars into {} chunks of up to {}",
        text.chars().count(),
        chunks.len(),
        config.chunk_size
    );
    Ok(orchestrator.run(chunks).await)
}

/// Resolve a local path, URL or `-` (stdin) and generate questions from it.
pub async fn generate_from_input(
    input_str: impl AsRef<str>,
    config: &QuizConfig,
) -> Result<GenerationOutput, QuizGenError> {
    let input_str = input_str.as_ref();
    info!("Starting generation: {}", input_str);

    let extracted = input::resolve_input(input_str, config.download_timeout_secs).await?;
    info!(
        "Input has {} characters across {} pages",
        extracted.char_count(),
        extracted.page_count
    );
    generate_from_text(&extracted.text, config).await
}

/// Generate from `input_str` and write the question list as JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &QuizConfig,
) -> Result<GenerationStats, QuizGenError> {
    let output = generate_from_input(input_str, config).await?;
    write_questions(&output, output_path.as_ref()).await?;
    Ok(output.stats)
}

/// Write `output.questions` to `path` as pretty-printed JSON.
pub async fn write_questions(output: &GenerationOutput, path: &Path) -> Result<(), QuizGenError> {
    let write_err = |source: std::io::Error| QuizGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(&output.questions)
        .map_err(|e| QuizGenError::Internal(format!("serialising questions: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!(
        "Wrote {} questions to {}",
        output.questions.len(),
        path.display()
    );
    Ok(())
}

/// Synchronous wrapper around [`generate_from_text`].
///
/// Creates a temporary tokio runtime internally; do not call from inside
/// an async context.
pub fn generate_sync(text: &str, config: &QuizConfig) -> Result<GenerationOutput, QuizGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_from_text(text, config))
}

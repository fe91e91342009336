//! Error types for the edgequake-quizgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizGenError`]: **Fatal**: the run cannot start at all (primary
//!   credential missing, input text too short, unreadable input file).
//!   Returned as `Err(QuizGenError)` from the top-level `generate*` functions.
//!
//! * [`ChunkError`]: **Non-fatal**: one provider attempt for one chunk
//!   failed. Stored inside [`crate::output::ChunkResult::failures`] so callers
//!   can see which provider was tried and why, while every other chunk keeps
//!   going.
//!
//! A third, parser-local type ([`crate::pipeline::parse::ParseError`]) is
//! converted into [`ChunkError::UnparseableResponse`] by the orchestrator,
//! which is the only place that knows which provider produced the text.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-quizgen library.
///
/// Per-chunk failures use [`ChunkError`] and never surface here.
#[derive(Debug, Error)]
pub enum QuizGenError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The primary provider credential is absent. Nothing is generated.
    #[error("Primary provider API key is missing.\nSet {env_var} or pass a pre-built primary provider.")]
    MissingPrimaryKey { env_var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Extracted text is below the minimum length gate.
    #[error("Document text too short or unreadable: {chars} characters (minimum {min})")]
    TextTooShort { chars: usize, min: usize },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file path, URL, or `-`.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// The input is a raw PDF rather than its extracted text.
    #[error("'{input}' is a PDF file, not extracted text.\nExtract it first, e.g.: pdftotext {input} -")]
    NotExtractedText { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some chunks succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::GenerationOutput::into_result`] when the
    /// caller wants to treat any chunk failure as an error.
    #[error("{failed}/{total} chunks failed during generation")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of one provider attempt on one chunk.
///
/// The variants form a closed set: anything a provider adapter or the parser
/// can go wrong with maps to exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkError {
    /// The provider could not be reached, or its client never initialised.
    #[error("{provider} unavailable: {detail}")]
    ProviderUnavailable { provider: String, detail: String },

    /// The provider answered with an error status or the call timed out.
    #[error("{provider} call failed: {detail}")]
    ProviderCallFailed { provider: String, detail: String },

    /// No JSON question array could be recovered from the provider output.
    #[error("{provider} returned an unparseable response ({raw_chars} chars): {excerpt}")]
    UnparseableResponse {
        provider: String,
        raw_chars: usize,
        excerpt: String,
    },

    /// No secondary provider is configured, so there is nothing to fall back to.
    #[error("no fallback provider configured")]
    SecondaryNotConfigured,
}

impl ChunkError {
    /// Name of the provider this attempt was made against, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            ChunkError::ProviderUnavailable { provider, .. }
            | ChunkError::ProviderCallFailed { provider, .. }
            | ChunkError::UnparseableResponse { provider, .. } => Some(provider),
            ChunkError::SecondaryNotConfigured => None,
        }
    }

    /// Build an [`ChunkError::UnparseableResponse`] with a bounded excerpt of `raw`.
    pub fn unparseable(provider: impl Into<String>, raw: &str, max_chars: usize) -> Self {
        ChunkError::UnparseableResponse {
            provider: provider.into(),
            raw_chars: raw.chars().count(),
            excerpt: excerpt(raw, max_chars),
        }
    }
}

/// Truncate `text` to at most `max_chars` characters, appending `…` when cut.
///
/// Works on `char` boundaries so multi-byte text never panics.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}\u{2026}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = QuizGenError::PartialFailure {
            success: 2,
            failed: 1,
            total: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/3"), "got: {msg}");
    }

    #[test]
    fn missing_key_names_env_var() {
        let e = QuizGenError::MissingPrimaryKey {
            env_var: "GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn text_too_short_display() {
        let e = QuizGenError::TextTooShort { chars: 499, min: 500 };
        let msg = e.to_string();
        assert!(msg.contains("499"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn chunk_error_provider_names() {
        let e = ChunkError::ProviderCallFailed {
            provider: "huggingface".into(),
            detail: "HTTP 503".into(),
        };
        assert_eq!(e.provider(), Some("huggingface"));
        assert!(e.to_string().contains("HTTP 503"));
        assert_eq!(ChunkError::SecondaryNotConfigured.provider(), None);
    }

    #[test]
    fn unparseable_excerpt_is_bounded() {
        let raw = "x".repeat(1000);
        let e = ChunkError::unparseable("gemini", &raw, 200);
        match e {
            ChunkError::UnparseableResponse {
                raw_chars, excerpt, ..
            } => {
                assert_eq!(raw_chars, 1000);
                assert_eq!(excerpt.chars().count(), 201);
                assert!(excerpt.ends_with('\u{2026}'));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn excerpt_handles_multibyte_text() {
        assert_eq!(excerpt("héllo wörld", 4), "héll\u{2026}");
        assert_eq!(excerpt("short", 10), "short");
    }

    #[test]
    fn chunk_error_serialises_with_kind_tag() {
        let json = serde_json::to_string(&ChunkError::SecondaryNotConfigured).unwrap();
        assert_eq!(json, r#"{"kind":"secondary_not_configured"}"#);
    }
}

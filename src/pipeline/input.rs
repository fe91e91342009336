//! Input resolution: turn a user-supplied path, URL, or `-` into text.
//!
//! Text extraction from PDFs happens upstream (`pdftotext`, a PDF library,
//! an OCR service…); this crate starts from the extracted text. Extractors
//! conventionally separate pages with a form feed (`\x0c`), which is how
//! [`ExtractedText::new`] derives a page count. Raw PDFs are recognised by
//! their `%PDF` magic bytes and rejected with a hint instead of being fed to
//! the LLM as binary noise.

use crate::error::QuizGenError;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

const PAGE_BREAK: char = '\u{c}';

/// Extracted document text plus the number of pages it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

impl ExtractedText {
    /// Wrap extractor output, counting form-feed separated pages.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let page_count = text
            .split(PAGE_BREAK)
            .filter(|page| !page.trim().is_empty())
            .count();
        Self { text, page_count }
    }

    /// Concatenate per-page text as returned by a page-by-page extractor.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut page_count = 0;
        for page in pages {
            text.push_str(page.as_ref());
            page_count += 1;
        }
        Self { text, page_count }
    }

    /// Length in characters, the unit every size limit uses.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Reject text below `min_chars`; see [`ensure_min_length`].
    pub fn ensure_min_length(&self, min_chars: usize) -> Result<(), QuizGenError> {
        ensure_min_length(&self.text, min_chars)
    }
}

/// Reject text shorter than `min_chars` characters as too short/unreadable.
///
/// Scanned PDFs without a text layer typically extract to a few stray
/// characters; generating questions from that wastes provider calls.
pub fn ensure_min_length(text: &str, min_chars: usize) -> Result<(), QuizGenError> {
    let chars = text.chars().count();
    if chars < min_chars {
        return Err(QuizGenError::TextTooShort {
            chars,
            min: min_chars,
        });
    }
    Ok(())
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input to extracted text.
///
/// * `-` reads standard input
/// * `http://` / `https://` downloads with `timeout_secs`
/// * anything else is a local file path
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ExtractedText, QuizGenError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QuizGenError::InvalidInput {
            input: input.to_string(),
            reason: "empty input".into(),
        });
    }

    let bytes = if input == "-" {
        read_stdin().await?
    } else if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    let text = decode_text(&bytes, input)?;
    let extracted = ExtractedText::new(text);
    debug!(
        "Resolved '{}': {} chars, {} pages",
        input,
        extracted.char_count(),
        extracted.page_count
    );
    Ok(extracted)
}

fn decode_text(bytes: &[u8], input: &str) -> Result<String, QuizGenError> {
    if bytes.starts_with(b"%PDF") {
        return Err(QuizGenError::NotExtractedText {
            input: input.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

async fn read_stdin() -> Result<Vec<u8>, QuizGenError> {
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .map_err(|e| QuizGenError::InvalidInput {
            input: "-".into(),
            reason: format!("failed to read stdin: {e}"),
        })?;
    Ok(buf)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, QuizGenError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(QuizGenError::FileNotFound { path })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(QuizGenError::PermissionDenied { path })
        }
        Err(e) => Err(QuizGenError::InvalidInput {
            input: path_str.to_string(),
            reason: e.to_string(),
        }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, QuizGenError> {
    info!("Downloading text from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QuizGenError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            QuizGenError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            QuizGenError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(QuizGenError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| QuizGenError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

//! Response parsing: recover question records from raw LLM output.
//!
//! Providers are asked for a bare JSON array but routinely wrap it in prose,
//! Markdown fences, or a JSON string. Recovery runs in a fixed order and
//! stops at the first candidate that decodes to an array:
//!
//! 1. strict decode of the whole (trimmed) text
//! 2. the first `[ { … } ]` span, matched non-greedily across newlines
//! 3. the widest `[ … ]` span
//!
//! Spans found in steps 2 and 3 must contain at least one object or string
//! element; a bracketed citation like `[1]` is not a question list. If no
//! candidate qualifies, the result is [`ParseError::Unparseable`]; the
//! parser never fabricates a question list. Once an array is found each element is
//! normalised on its own (see [`parse_questions`]).
//!
//! Everything here is pure: no I/O, no logging, no configuration.

use crate::output::QuestionRecord;
use crate::provider::ProviderResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Parser-local failure. The orchestrator turns it into
/// [`crate::error::ChunkError::UnparseableResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON question array found in {raw_chars} characters of output")]
    Unparseable { raw_chars: usize },
}

static RE_OBJECT_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").unwrap());

static RE_WIDEST_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Parse raw provider text into question records.
///
/// Element rules, applied to each item of the recovered array:
/// - object → record; missing fields become empty, numbers are stringified,
///   objects with neither question text nor options are skipped
/// - string → decoded again as a JSON object if possible, otherwise kept as
///   a degraded record (`question` = the string, no options, no answer);
///   blank strings are skipped
/// - anything else (numbers, booleans, null, nested arrays) → skipped
///
/// An empty array is a successful parse with zero records.
pub fn parse_questions(raw: &str) -> Result<Vec<QuestionRecord>, ParseError> {
    let items = decode_array(raw).ok_or(ParseError::Unparseable {
        raw_chars: raw.chars().count(),
    })?;
    Ok(items.into_iter().filter_map(normalise_item).collect())
}

/// Normalise a provider payload to text, then [`parse_questions`] it.
pub fn parse_response(response: &ProviderResponse) -> Result<Vec<QuestionRecord>, ParseError> {
    parse_questions(&response.to_text())
}

fn decode_array(raw: &str) -> Option<Vec<Value>> {
    let trimmed = raw.trim();
    if let Some(items) = strict_array(trimmed) {
        return Some(items);
    }
    [&*RE_OBJECT_ARRAY, &*RE_WIDEST_ARRAY]
        .into_iter()
        .filter_map(|re| re.find(trimmed))
        .filter_map(|m| strict_array(m.as_str()))
        .find(|items| has_question_like(items))
}

/// A span cut out of prose only counts if it could hold a question.
/// `[1]` or `[2, 3]` in a citation must not turn a refusal into an
/// empty success.
fn has_question_like(items: &[Value]) -> bool {
    items
        .iter()
        .any(|v| matches!(v, Value::Object(_) | Value::String(_)))
}

/// Decode `text` as an array, or as a JSON string whose content is an array.
fn strict_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        Value::String(inner) => match serde_json::from_str::<Value>(inner.trim()).ok()? {
            Value::Array(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn normalise_item(item: Value) -> Option<QuestionRecord> {
    match item {
        Value::Object(map) => record_from_object(&map),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => record_from_object(&map),
                _ => Some(QuestionRecord::degraded(trimmed)),
            }
        }
        _ => None,
    }
}

fn record_from_object(map: &Map<String, Value>) -> Option<QuestionRecord> {
    let question = map.get("question").and_then(scalar_text).unwrap_or_default();
    let options: Vec<String> = match map.get("options") {
        Some(Value::Array(opts)) => opts.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    };
    let correct_answer = map
        .get("correct_answer")
        .or_else(|| map.get("answer"))
        .and_then(scalar_text)
        .unwrap_or_default();

    if question.trim().is_empty() && options.is_empty() {
        return None;
    }

    Some(QuestionRecord {
        question,
        options,
        correct_answer,
    })
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

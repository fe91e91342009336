//! Question providers: the uniform "generate questions from a chunk" seam.
//!
//! Both the primary ([`primary::LlmQuestionProvider`]) and the secondary
//! ([`secondary::HttpInferenceProvider`]) implement [`QuestionProvider`], so
//! the orchestrator treats them identically and tests can substitute either
//! one with an in-memory fake.
//!
//! Adapters never retry; one call is one attempt. Retrying against the other
//! provider is the orchestrator's job.

pub mod primary;
pub mod secondary;

use crate::error::ChunkError;
use crate::pipeline::chunk::TextChunk;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use primary::LlmQuestionProvider;
pub use secondary::HttpInferenceProvider;

/// Field carrying the model output in inference-endpoint payloads.
const GENERATED_TEXT_FIELD: &str = "generated_text";

/// Generates quiz questions for a single chunk.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Short provider name used in diagnostics (`"gemini"`, `"huggingface"`).
    fn name(&self) -> &str;

    /// Make exactly one generation call for `chunk`.
    async fn generate(&self, chunk: &TextChunk) -> Result<ProviderResponse, ChunkError>;
}

/// A provider payload before parsing.
///
/// Inference endpoints disagree on shape: a list of `{generated_text}`
/// objects, a single such object, or plain text. The variants capture the
/// shape once so [`ProviderResponse::to_text`] is the only place that
/// inspects it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    Array(Vec<Value>),
    Object(Map<String, Value>),
    PlainText(String),
}

impl ProviderResponse {
    /// Classify an HTTP body.
    ///
    /// Anything that is not a JSON array or object (including invalid JSON
    /// and bare JSON strings) is kept as plain text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(Value::Array(items)) => ProviderResponse::Array(items),
            Ok(Value::Object(map)) => ProviderResponse::Object(map),
            _ => ProviderResponse::PlainText(body.to_string()),
        }
    }

    /// Resolve the payload to the single raw text the parser works on.
    ///
    /// - array whose first element has `generated_text` → that text
    /// - object with `generated_text` → that text
    /// - plain text → itself
    ///
    /// Arrays and objects without the field are re-serialised unchanged, so
    /// an endpoint that returns the question array directly still parses.
    pub fn to_text(&self) -> String {
        match self {
            ProviderResponse::Array(items) => items
                .first()
                .and_then(|first| generated_text(first.as_object()?))
                .unwrap_or_else(|| Value::Array(items.clone()).to_string()),
            ProviderResponse::Object(map) => generated_text(map)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
            ProviderResponse::PlainText(text) => text.clone(),
        }
    }
}

fn generated_text(map: &Map<String, Value>) -> Option<String> {
    match map.get(GENERATED_TEXT_FIELD)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_of_generated_text_objects() {
        let body = json!([{ "generated_text": "[1]" }, { "generated_text": "ignored" }]).to_string();
        let resp = ProviderResponse::from_body(&body);
        assert!(matches!(resp, ProviderResponse::Array(_)));
        assert_eq!(resp.to_text(), "[1]");
    }

    #[test]
    fn single_generated_text_object() {
        let body = json!({ "generated_text": "hello" }).to_string();
        let resp = ProviderResponse::from_body(&body);
        assert!(matches!(resp, ProviderResponse::Object(_)));
        assert_eq!(resp.to_text(), "hello");
    }

    #[test]
    fn plain_text_body() {
        let resp = ProviderResponse::from_body("not json at all");
        assert_eq!(resp, ProviderResponse::PlainText("not json at all".into()));
        assert_eq!(resp.to_text(), "not json at all");
    }

    #[test]
    fn question_array_without_field_is_reserialised() {
        let body = json!([{ "question": "Q", "options": ["a"], "correct_answer": "a" }]).to_string();
        let text = ProviderResponse::from_body(&body).to_text();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back[0]["question"], "Q");
    }

    #[test]
    fn error_object_is_reserialised() {
        let body = json!({ "error": "Model is loading" }).to_string();
        assert!(ProviderResponse::from_body(&body).to_text().contains("Model is loading"));
    }
}

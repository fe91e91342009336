//! Integration tests for the primary → secondary fallback pipeline.
//!
//! Providers are in-memory fakes implementing `QuestionProvider`, so these
//! tests run offline and deterministically.

use async_trait::async_trait;
use edgequake_quizgen::{
    chunk_text, generate_from_text, generate_questions, generate_stream, AnswerCheck, ChunkError,
    GenerationProgressCallback, ProviderResponse, QuestionProvider, QuestionRecord, QuizConfig,
    QuizGenError, TextChunk,
};
use futures::StreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

type Script = Box<dyn Fn(&TextChunk) -> Result<ProviderResponse, ChunkError> + Send + Sync>;

/// A provider whose reply is computed from the chunk.
struct Scripted {
    name: &'static str,
    script: Script,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(
        name: &'static str,
        script: impl Fn(&TextChunk) -> Result<ProviderResponse, ChunkError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionProvider for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, chunk: &TextChunk) -> Result<ProviderResponse, ChunkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(chunk)
    }
}

/// `n` questions tagged with the chunk index and a source label.
fn questions_json(chunk: usize, source: &str, n: usize) -> String {
    let records: Vec<QuestionRecord> = (0..n)
        .map(|i| {
            QuestionRecord::new(
                format!("{source} chunk{chunk} q{i}"),
                ["alpha", "beta", "gamma", "delta"],
                "alpha",
            )
        })
        .collect();
    serde_json::to_string(&records).unwrap()
}

fn call_failed(provider: &str) -> ChunkError {
    ChunkError::ProviderCallFailed {
        provider: provider.to_string(),
        detail: "HTTP 500 Internal Server Error".into(),
    }
}

#[derive(Default)]
struct Recorder {
    diagnostics: Mutex<Vec<String>>,
    progress: Mutex<Vec<(usize, usize)>>,
    errors: AtomicUsize,
    started: Mutex<Vec<usize>>,
    finished: Mutex<Vec<(usize, usize, usize)>>,
}

impl GenerationProgressCallback for Recorder {
    fn on_generation_start(&self, total_chunks: usize) {
        self.started.lock().unwrap().push(total_chunks);
    }

    fn on_generation_complete(&self, total_chunks: usize, succeeded: usize, questions: usize) {
        self.finished
            .lock()
            .unwrap()
            .push((total_chunks, succeeded, questions));
    }

    fn on_diagnostic(&self, message: &str) {
        self.diagnostics.lock().unwrap().push(message.to_string());
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }

    fn on_chunk_error(&self, _chunk_index: usize, _error: &ChunkError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn questions_of(output: &edgequake_quizgen::GenerationOutput) -> Vec<&str> {
    output.questions.iter().map(|q| q.question.as_str()).collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seven_thousand_chars_with_one_fallback_chunk() {
    let primary = Scripted::new("gemini", |chunk| match chunk.index() {
        1 => Err(call_failed("gemini")),
        i => Ok(ProviderResponse::PlainText(questions_json(i, "primary", 3))),
    });
    let secondary = Scripted::new("huggingface", |chunk| {
        Ok(ProviderResponse::Array(vec![json!({
            "generated_text": questions_json(chunk.index(), "secondary", 2)
        })]))
    });
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .primary(primary.clone())
        .secondary(secondary.clone())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let output = generate_from_text(&"x".repeat(7000), &config).await.unwrap();

    let sizes: Vec<usize> = chunk_text(&"x".repeat(7000), 3000)
        .iter()
        .map(|c| c.size())
        .collect();
    assert_eq!(sizes, vec![3000, 3000, 1000]);

    assert_eq!(output.questions.len(), 8);
    assert_eq!(
        questions_of(&output),
        vec![
            "primary chunk0 q0",
            "primary chunk0 q1",
            "primary chunk0 q2",
            "secondary chunk1 q0",
            "secondary chunk1 q1",
            "primary chunk2 q0",
            "primary chunk2 q1",
            "primary chunk2 q2",
        ]
    );
    assert_eq!(primary.calls(), 3);
    assert_eq!(secondary.calls(), 1);

    assert_eq!(output.stats.total_chunks, 3);
    assert_eq!(output.stats.succeeded_chunks, 3);
    assert_eq!(output.stats.fallback_chunks, 1);
    assert_eq!(output.stats.failed_chunks, 0);
    assert_eq!(output.chunks[1].provider.as_deref(), Some("huggingface"));
    assert_eq!(output.chunks[1].failures, vec![call_failed("gemini")]);

    let diagnostics = recorder.diagnostics.lock().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("gemini"), "got: {}", diagnostics[0]);
    assert!(diagnostics[0].contains("500"), "got: {}", diagnostics[0]);

    let progress = recorder.progress.lock().unwrap();
    assert_eq!(*progress, vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn primary_failure_without_secondary_keeps_other_chunks() {
    let primary = Scripted::new("gemini", |chunk| match chunk.index() {
        1 => Err(ChunkError::ProviderUnavailable {
            provider: "gemini".into(),
            detail: "quota exceeded".into(),
        }),
        i => Ok(ProviderResponse::PlainText(questions_json(i, "primary", 3))),
    });
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .primary(primary)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let output = generate_from_text(&"y".repeat(7000), &config).await.unwrap();

    assert_eq!(output.questions.len(), 6);
    assert!(output.questions[3].question.starts_with("primary chunk2"));
    assert_eq!(output.stats.failed_chunks, 1);
    assert_eq!(
        output.chunks[1].error(),
        Some(&ChunkError::SecondaryNotConfigured)
    );
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
    assert!(recorder
        .diagnostics
        .lock()
        .unwrap()
        .iter()
        .any(|d| d.contains("no fallback provider configured")));

    match output.into_result() {
        Err(QuizGenError::PartialFailure {
            success,
            failed,
            total,
        }) => assert_eq!((success, failed, total), (2, 1, 3)),
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn every_chunk_failing_still_returns_output() {
    let config = QuizConfig::builder()
        .primary(Scripted::new("gemini", |_| Err(call_failed("gemini"))))
        .secondary(Scripted::new("huggingface", |_| {
            Ok(ProviderResponse::PlainText("<html>502 Bad Gateway</html>".into()))
        }))
        .build()
        .unwrap();

    let output = generate_from_text(&"z".repeat(3500), &config).await.unwrap();
    assert!(output.questions.is_empty());
    assert_eq!(output.stats.failed_chunks, 2);
    for chunk in &output.chunks {
        assert_eq!(chunk.failures.len(), 2);
        assert!(matches!(
            chunk.failures[1],
            ChunkError::UnparseableResponse { .. }
        ));
    }
}

#[tokio::test]
async fn recovers_array_embedded_in_prose() {
    let config = QuizConfig::builder()
        .primary(Scripted::new("gemini", |chunk| {
            Ok(ProviderResponse::PlainText(format!(
                "Sure! Here are your questions:\n```json\n{}\n```\nGood luck.",
                questions_json(chunk.index(), "primary", 3)
            )))
        }))
        .build()
        .unwrap();

    let output = generate_from_text(&"w".repeat(600), &config).await.unwrap();
    assert_eq!(output.questions.len(), 3);
    assert_eq!(output.questions[0].options.len(), 4);
}

#[tokio::test]
async fn citation_only_reply_falls_back_to_secondary() {
    let primary = Scripted::new("gemini", |_| {
        Ok(ProviderResponse::PlainText(
            "Sorry, the passage is too short to write questions [1].".into(),
        ))
    });
    let secondary = Scripted::new("huggingface", |chunk| {
        Ok(ProviderResponse::PlainText(questions_json(
            chunk.index(),
            "secondary",
            2,
        )))
    });
    let config = QuizConfig::builder()
        .primary(primary.clone())
        .secondary(secondary.clone())
        .build()
        .unwrap();

    let output = generate_from_text(&"w".repeat(600), &config).await.unwrap();
    assert_eq!(secondary.calls(), 1);

    let chunk = &output.chunks[0];
    assert_eq!(chunk.provider.as_deref(), Some("huggingface"));
    assert!(matches!(
        chunk.failures[0],
        ChunkError::UnparseableResponse { .. }
    ));
    assert_eq!(
        questions_of(&output),
        vec!["secondary chunk0 q0", "secondary chunk0 q1"]
    );
}

#[tokio::test]
async fn min_length_gate_at_boundary() {
    let primary = Scripted::new("gemini", |chunk| {
        Ok(ProviderResponse::PlainText(questions_json(chunk.index(), "primary", 1)))
    });
    let config = QuizConfig::builder().primary(primary.clone()).build().unwrap();

    let err = generate_from_text(&"a".repeat(499), &config).await.unwrap_err();
    assert!(matches!(
        err,
        QuizGenError::TextTooShort {
            chars: 499,
            min: 500
        }
    ));
    assert_eq!(primary.calls(), 0);

    let output = generate_from_text(&"a".repeat(500), &config).await.unwrap();
    assert_eq!(output.stats.total_chunks, 1);
    assert_eq!(output.questions.len(), 1);
}

#[tokio::test]
async fn missing_primary_key_is_fatal() {
    let config = QuizConfig::default();
    let err = generate_questions(vec![TextChunk::new(0, "text")], &config)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizGenError::MissingPrimaryKey { .. }));
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn letter_answers_are_resolved_under_default_check() {
    let config = QuizConfig::builder()
        .primary(Scripted::new("gemini", |_| {
            Ok(ProviderResponse::PlainText(
                json!([{
                    "question": "Which organelle makes ATP?",
                    "options": ["Nucleus", "Mitochondrion", "Ribosome", "Golgi"],
                    "correct_answer": "B"
                }])
                .to_string(),
            ))
        }))
        .build()
        .unwrap();
    assert_eq!(config.answer_check, AnswerCheck::Warn);

    let output = generate_questions(vec![TextChunk::new(0, "cells")], &config)
        .await
        .unwrap();
    assert_eq!(output.questions[0].correct_answer, "Mitochondrion");
}

// ── Concurrency and streaming ────────────────────────────────────────────────

/// Later chunks answer faster, so completion order is reversed.
struct Slow;

#[async_trait]
impl QuestionProvider for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, chunk: &TextChunk) -> Result<ProviderResponse, ChunkError> {
        let delay = 10 * (5 - chunk.index().min(5)) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(ProviderResponse::PlainText(questions_json(
            chunk.index(),
            "slow",
            1,
        )))
    }
}

fn five_chunks() -> Vec<TextChunk> {
    chunk_text(&"c".repeat(5000), 1000)
}

#[tokio::test]
async fn concurrent_run_preserves_chunk_order() {
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .primary(Arc::new(Slow))
        .concurrency(5)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let output = generate_questions(five_chunks(), &config).await.unwrap();
    let expected: Vec<String> = (0..5).map(|i| format!("slow chunk{i} q0")).collect();
    assert_eq!(questions_of(&output), expected);

    let progress = recorder.progress.lock().unwrap();
    assert_eq!(progress.len(), 5);
    assert_eq!(progress.last(), Some(&(5, 5)));
}

#[tokio::test]
async fn stream_yields_results_in_chunk_order() {
    let config = QuizConfig::builder()
        .primary(Arc::new(Slow))
        .concurrency(3)
        .build()
        .unwrap();

    let results: Vec<_> = generate_stream(five_chunks(), &config)
        .unwrap()
        .collect()
        .await;

    let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert!(results.iter().all(|r| r.is_success()));
}

#[tokio::test]
async fn stream_reports_start_and_completion() {
    let recorder = Arc::new(Recorder::default());
    let primary = Scripted::new("gemini", |chunk| match chunk.index() {
        2 => Err(call_failed("gemini")),
        i => Ok(ProviderResponse::PlainText(questions_json(i, "primary", 2))),
    });
    let config = QuizConfig::builder()
        .primary(primary)
        .concurrency(2)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let mut stream = generate_stream(five_chunks(), &config).unwrap();
    assert_eq!(*recorder.started.lock().unwrap(), vec![5]);

    let mut yielded = 0;
    while stream.next().await.is_some() {
        yielded += 1;
        if yielded < 5 {
            assert!(recorder.finished.lock().unwrap().is_empty());
        }
    }
    assert_eq!(*recorder.finished.lock().unwrap(), vec![(5, 4, 8)]);
}

#[tokio::test]
async fn empty_stream_completes_immediately() {
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .primary(Arc::new(Slow))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let results: Vec<_> = generate_stream(Vec::new(), &config)
        .unwrap()
        .collect()
        .await;
    assert!(results.is_empty());
    assert_eq!(*recorder.started.lock().unwrap(), vec![0]);
    assert_eq!(*recorder.finished.lock().unwrap(), vec![(0, 0, 0)]);
}

#[test]
fn stream_requires_primary_before_starting() {
    assert!(matches!(
        generate_stream(five_chunks(), &QuizConfig::default()),
        Err(QuizGenError::MissingPrimaryKey { .. })
    ));
}

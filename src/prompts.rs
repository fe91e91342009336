//! The instruction prompt sent to every question provider.
//!
//! Both providers receive the same text so a chunk that falls back to the
//! secondary is asked exactly the same question. The JSON shape spelled out
//! here must stay in sync with [`crate::output::QuestionRecord`].

/// Number of questions requested per chunk unless configured otherwise.
pub const DEFAULT_QUESTIONS_PER_CHUNK: usize = 3;

/// Prompt template. `{count}` and `{text}` are substituted by [`question_prompt`].
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"You are an exam question generator.

From the text below, generate {count} multiple-choice questions.
Each question must have:
- question
- 4 options
- correct_answer

Return STRICT JSON format like:
[
  {
    "question": "",
    "options": ["", "", "", ""],
    "correct_answer": ""
  }
]

TEXT:
{text}
"#;

/// Build the full prompt for one chunk.
pub fn question_prompt(chunk_text: &str, count: usize) -> String {
    QUESTION_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{text}", chunk_text)
}

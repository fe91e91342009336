//! Post-parse answer validation.
//!
//! Models are told that `correct_answer` must repeat one of the four
//! options, and often answer with the option letter instead (`"B"`,
//! `"c)"`, `"Option D"`). This stage trims every field, maps such letters
//! back to the option text, and applies the configured
//! [`AnswerCheck`] policy to whatever still does not match.

use crate::config::AnswerCheck;
use crate::output::QuestionRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ANSWER_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:option\s+)?([a-z])\s*[).:]?$").unwrap());

/// Records after validation plus what happened to the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckedQuestions {
    pub records: Vec<QuestionRecord>,
    /// Records whose answer is not among their options (kept or not).
    pub mismatched: usize,
    /// Records dropped under [`AnswerCheck::Strict`].
    pub rejected: usize,
}

/// Apply `policy` to freshly parsed records.
pub fn check_answers(records: Vec<QuestionRecord>, policy: AnswerCheck) -> CheckedQuestions {
    let mut out = CheckedQuestions::default();

    for mut record in records {
        trim_fields(&mut record);
        if policy == AnswerCheck::Off {
            out.records.push(record);
            continue;
        }

        resolve_answer_letter(&mut record);
        if record.answer_in_options() {
            out.records.push(record);
            continue;
        }

        out.mismatched += 1;
        match policy {
            AnswerCheck::Strict => out.rejected += 1,
            _ => out.records.push(record),
        }
    }

    out
}

fn trim_fields(record: &mut QuestionRecord) {
    record.question = record.question.trim().to_string();
    record.correct_answer = record.correct_answer.trim().to_string();
    for opt in &mut record.options {
        *opt = opt.trim().to_string();
    }
}

/// Replace a letter-style answer with the option at that position.
///
/// A letter that is itself one of the options (e.g. options `["A", "B"]`)
/// is left untouched.
fn resolve_answer_letter(record: &mut QuestionRecord) {
    if record.answer_in_options() {
        return;
    }
    let Some(caps) = RE_ANSWER_LETTER.captures(&record.correct_answer) else {
        return;
    };
    let letter = caps[1].to_ascii_uppercase().as_bytes()[0];
    let idx = (letter - b'A') as usize;
    if let Some(opt) = record.options.get(idx) {
        record.correct_answer = opt.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(answer: &str) -> QuestionRecord {
        QuestionRecord::new("Q", ["Paris", "Rome", "Berlin", "Madrid"], answer)
    }

    #[test]
    fn fields_are_trimmed() {
        let rec = QuestionRecord::new("  Q  ", [" a ", "b\n"], " a ");
        let out = check_answers(vec![rec], AnswerCheck::Off);
        assert_eq!(out.records[0], QuestionRecord::new("Q", ["a", "b"], "a"));
    }

    #[test]
    fn letter_answers_resolve_to_option_text() {
        for (answer, expected) in [("B", "Rome"), ("c)", "Berlin"), ("Option D", "Madrid"), ("a.", "Paris")] {
            let out = check_answers(vec![q(answer)], AnswerCheck::Warn);
            assert_eq!(out.records[0].correct_answer, expected, "answer {answer:?}");
            assert_eq!(out.mismatched, 0);
        }
    }

    #[test]
    fn letter_that_is_an_option_is_kept() {
        let rec = QuestionRecord::new("Pick", ["B", "C", "D", "A"], "A");
        let out = check_answers(vec![rec], AnswerCheck::Strict);
        assert_eq!(out.records[0].correct_answer, "A");
    }

    #[test]
    fn out_of_range_letter_stays_mismatched() {
        let out = check_answers(vec![q("F")], AnswerCheck::Warn);
        assert_eq!(out.records[0].correct_answer, "F");
        assert_eq!(out.mismatched, 1);
    }

    #[test]
    fn off_does_not_resolve_letters() {
        let out = check_answers(vec![q("B")], AnswerCheck::Off);
        assert_eq!(out.records[0].correct_answer, "B");
        assert_eq!(out.mismatched, 0);
    }

    #[test]
    fn warn_keeps_mismatches() {
        let out = check_answers(
            vec![q("Paris"), q("London"), QuestionRecord::degraded("text")],
            AnswerCheck::Warn,
        );
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.mismatched, 2);
        assert_eq!(out.rejected, 0);
    }

    #[test]
    fn strict_drops_mismatches_and_degraded() {
        let out = check_answers(
            vec![q("Paris"), q("London"), QuestionRecord::degraded("text")],
            AnswerCheck::Strict,
        );
        assert_eq!(out.records, vec![q("Paris")]);
        assert_eq!(out.rejected, 2);
    }
}

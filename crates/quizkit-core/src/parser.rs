//! Generated quiz text parser.
//!
//! Turns a raw text blob from a generation service into an ordered list of
//! questions. The input has no schema guarantee, so the parser classifies
//! lines tolerantly and never fails: text it cannot use yields an empty list
//! and the caller falls back to showing the raw text.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::Question;

/// Start of a question block: `Q<N>.` with any integer N.
static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Q\d+\.\s*").expect("valid regex"));

/// An option line: `<letter>)`, any alphabet.
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{L}\)").expect("valid regex"));

/// An answer line: `Answer:` in any case.
static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^answer:\s*").expect("valid regex"));

/// Parse generated quiz text into questions, in source order.
///
/// Blocks start at lines carrying a `Q<N>.` marker; numbering is not checked.
/// Text before the first marker is discarded. A block needs a non-empty
/// question and at least one option line to be kept; a missing answer line
/// leaves the answer key unknown. Any other line is ignored.
pub fn parse(raw: &str) -> Vec<Question> {
    split_blocks(raw)
        .into_iter()
        .filter_map(|block| parse_block(&block))
        .collect()
}

/// Group non-empty trimmed lines into blocks at question markers.
fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for line in raw.lines() {
        if QUESTION_MARKER.is_match(line) {
            blocks.push(Vec::new());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Lines before the first marker belong to no block.
        if let Some(current) = blocks.last_mut() {
            current.push(trimmed);
        }
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Option<Question> {
    if lines.len() < 2 {
        return None;
    }

    let text = QUESTION_MARKER.replace(lines[0], "").trim().to_string();
    let mut options = Vec::new();
    let mut correct_letter = None;

    for line in &lines[1..] {
        if OPTION_LINE.is_match(line) {
            options.push(line.to_string());
        } else if let Some(m) = ANSWER_LINE.find(line) {
            correct_letter = answer_key(&line[m.end()..]);
        }
    }

    if text.is_empty() || options.is_empty() {
        return None;
    }

    Some(Question {
        text,
        options,
        correct_letter,
    })
}

/// Extract the answer letter from the text after `Answer:`.
///
/// Accepts "b", "B", "b)", "b) Paris"; rejects words like "Paris".
fn answer_key(rest: &str) -> Option<char> {
    let value = rest.trim().to_lowercase();
    let mut chars = value.chars();
    let first = chars.next().filter(|c| c.is_alphabetic())?;
    match chars.next() {
        None => Some(first),
        Some(next) if !next.is_alphanumeric() => Some(first),
        Some(_) => None,
    }
}

/// Read a raw quiz text file (useful for replaying saved generations).
pub fn load_raw(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz text: {}", path.display()))
}

/// A warning from question validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Question position (if applicable).
    pub question_index: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check parsed questions for consistency issues that parsing tolerates.
pub fn validate_questions(questions: &[Question], requested: Option<u32>) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(requested) = requested {
        if questions.len() != requested as usize {
            warnings.push(ValidationWarning {
                question_index: None,
                message: format!(
                    "requested {requested} questions but parsed {}",
                    questions.len()
                ),
            });
        }
    }

    for (index, question) in questions.iter().enumerate() {
        match question.correct_letter {
            None => warnings.push(ValidationWarning {
                question_index: Some(index),
                message: "no answer line, question can never be scored correct".into(),
            }),
            Some(key) if question.answer_option().is_none() => {
                warnings.push(ValidationWarning {
                    question_index: Some(index),
                    message: format!("answer '{key}' does not match exactly one option"),
                });
            }
            Some(_) => {}
        }

        let mut seen = HashSet::new();
        for option in &question.options {
            if let Some(letter) = Question::option_letter(option) {
                if !seen.insert(letter) {
                    warnings.push(ValidationWarning {
                        question_index: Some(index),
                        message: format!("duplicate option letter '{letter}'"),
                    });
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "Q1. Capital of France?\na) London\nb) Paris\nc) Rome\nAnswer: b\nQ2. 2+2=?\na) 3\nb) 4\nAnswer: b\n";

    #[test]
    fn parse_two_blocks() {
        let questions = parse(TWO_QUESTIONS);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Capital of France?");
        assert_eq!(
            questions[0].options,
            vec!["a) London", "b) Paris", "c) Rome"]
        );
        assert_eq!(questions[0].correct_letter, Some('b'));
        assert_eq!(questions[1].text, "2+2=?");
        assert_eq!(questions[1].options, vec!["a) 3", "b) 4"]);
    }

    #[test]
    fn no_markers_parses_to_nothing() {
        let raw = "Here are some questions about France.\nWhat is the capital?\na) Paris";
        assert!(parse(raw).is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn block_without_options_is_dropped() {
        let raw = "Q1. Orphan question?\nAnswer: a\nQ2. Real question?\na) yes\nb) no\nAnswer: a";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Real question?");
    }

    #[test]
    fn missing_answer_line_keeps_block() {
        let raw = "Q1. Pick one\na) first\nb) second";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_letter, None);
    }

    #[test]
    fn single_line_block_is_dropped() {
        assert!(parse("Q1. Just a question?").is_empty());
    }

    #[test]
    fn empty_question_text_is_dropped() {
        assert!(parse("Q1.\na) one\nb) two\nAnswer: a").is_empty());
    }

    #[test]
    fn preamble_before_first_marker_is_discarded() {
        let raw = "Sure! Here are your questions:\n\nQ1. Largest planet?\na) Mars\nb) Jupiter\nAnswer: b";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Largest planet?");
    }

    #[test]
    fn numbering_is_not_validated() {
        let raw = "Q7. First?\na) x\nAnswer: a\nQ7. Second?\na) y\nAnswer: a\nQ2. Third?\na) z";
        let questions = parse(raw);
        let texts: Vec<&str> = questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["First?", "Second?", "Third?"]);
    }

    #[test]
    fn stray_lines_are_ignored() {
        let raw = "Q1. Color of the sky?\nThink carefully!\na) Blue\nb) Green\n(hint: look up)\nAnswer: A\n";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["a) Blue", "b) Green"]);
        assert_eq!(questions[0].correct_letter, Some('a'));
    }

    #[test]
    fn option_count_is_not_fixed() {
        let raw = "Q1. Many options\na) 1\nb) 2\nc) 3\nd) 4\ne) 5\nf) 6\nAnswer: f";
        let questions = parse(raw);
        assert_eq!(questions[0].options.len(), 6);
        assert_eq!(questions[0].answer_option(), Some("f) 6"));
    }

    #[test]
    fn uppercase_options_and_padding() {
        let raw = "  Q1.   Spaced out?  \r\n   A) Yes  \r\n  B) No\r\n  answer:   b  \r\n";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Spaced out?");
        assert_eq!(questions[0].options, vec!["A) Yes", "B) No"]);
        assert_eq!(questions[0].correct_letter, Some('b'));
    }

    #[test]
    fn answer_key_forms() {
        assert_eq!(answer_key(" b"), Some('b'));
        assert_eq!(answer_key("C"), Some('c'));
        assert_eq!(answer_key("b) Paris"), Some('b'));
        assert_eq!(answer_key("Paris"), None);
        assert_eq!(answer_key(""), None);
        assert_eq!(answer_key("2"), None);
    }

    #[test]
    fn last_answer_line_wins() {
        let raw = "Q1. Changed mind\na) x\nb) y\nAnswer: a\nAnswer: b";
        assert_eq!(parse(raw)[0].correct_letter, Some('b'));
    }

    #[test]
    fn parse_is_deterministic() {
        assert_eq!(parse(TWO_QUESTIONS), parse(TWO_QUESTIONS));
    }

    #[test]
    fn hostile_input_does_not_panic() {
        let inputs = [
            "Q",
            "Q1",
            "Q1.",
            "Q99999999999999999999999. big\na) ok",
            ")\n)\n)",
            "Answer:\nAnswer:",
            "Q1. ünïcödé?\nä) nope\na) ja\nAnswer: ä",
        ];
        for input in inputs {
            let _ = parse(input);
        }
    }

    #[test]
    fn non_ascii_option_letters() {
        let questions = parse("Q1. Welcher Buchstabe?\nä) erste\nö) zweite\nAnswer: Ö");
        assert_eq!(questions[0].options, vec!["ä) erste", "ö) zweite"]);
        assert_eq!(questions[0].correct_letter, Some('ö'));
        assert_eq!(questions[0].answer_option(), Some("ö) zweite"));

        let greek = parse("Q1. Πρωτεύουσα;\nα) Αθήνα\nβ) Ρώμη\nAnswer: α)");
        assert_eq!(greek[0].options.len(), 2);
        assert!(greek[0].is_correct_option("α) Αθήνα"));
    }

    #[test]
    fn validate_reports_inconsistent_keys() {
        let raw = "Q1. No key\na) x\nQ2. Bad key\na) x\nb) y\nAnswer: e\nQ3. Dupes\na) x\na) y\nAnswer: a";
        let questions = parse(raw);
        let warnings = validate_questions(&questions, Some(5));
        assert!(warnings
            .iter()
            .any(|w| w.question_index.is_none() && w.message.contains("requested 5")));
        assert!(warnings
            .iter()
            .any(|w| w.question_index == Some(0) && w.message.contains("no answer")));
        assert!(warnings
            .iter()
            .any(|w| w.question_index == Some(1) && w.message.contains("'e'")));
        assert!(warnings
            .iter()
            .any(|w| w.question_index == Some(2) && w.message.contains("duplicate")));
    }

    #[test]
    fn validate_clean_quiz() {
        let questions = parse(TWO_QUESTIONS);
        assert!(validate_questions(&questions, Some(2)).is_empty());
    }

    #[test]
    fn load_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.txt");
        std::fs::write(&path, TWO_QUESTIONS).unwrap();
        let raw = load_raw(&path).unwrap();
        assert_eq!(parse(&raw).len(), 2);
        assert!(load_raw(&dir.path().join("missing.txt")).is_err());
    }
}

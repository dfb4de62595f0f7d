//! Collaborator contracts for quiz generation and score persistence.
//!
//! These async traits are implemented by the `quizkit-providers` crate.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::model::{HistoryEntry, ScoreSubmission};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// A backend that produces raw quiz text for a topic.
///
/// Failures should be returned as [`crate::error::GenerationError`] wrapped
/// in `anyhow::Error` so callers can classify them.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "api").
    fn name(&self) -> &str;

    /// Generate raw question text. The output carries no format guarantee.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String>;
}

/// Durable storage for finished quiz attempts.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Record one attempt. There is no partial success.
    async fn save_score(&self, submission: &ScoreSubmission) -> anyhow::Result<()>;
}

/// Read access to previously persisted interactions.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All entries, newest first.
    async fn list_history(&self) -> anyhow::Result<Vec<HistoryEntry>>;
}

// ---------------------------------------------------------------------------
// Generation request
// ---------------------------------------------------------------------------

/// Question counts a quiz can be generated with.
pub const ALLOWED_COUNTS: [u32; 4] = [5, 10, 15, 20];

/// Maximum topic length in characters.
pub const MAX_TOPIC_CHARS: usize = 500;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// A validated request for generated quiz text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub count: u32,
}

impl GenerateRequest {
    /// Validate and normalize a topic/count pair.
    ///
    /// The topic is trimmed, stripped of HTML tags and truncated to
    /// [`MAX_TOPIC_CHARS`]; the count must be one of [`ALLOWED_COUNTS`].
    pub fn new(topic: &str, count: u32) -> Result<Self, RequestError> {
        let topic = sanitize_topic(topic);
        if topic.is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        if !ALLOWED_COUNTS.contains(&count) {
            return Err(RequestError::InvalidCount(count));
        }
        Ok(Self { topic, count })
    }
}

fn sanitize_topic(topic: &str) -> String {
    let stripped = HTML_TAG.replace_all(topic.trim(), "");
    stripped.chars().take(MAX_TOPIC_CHARS).collect::<String>().trim().to_string()
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Build the instruction sent to a generative model so that its output
/// matches what [`crate::parser::parse`] understands.
pub fn build_mcq_prompt(request: &GenerateRequest) -> String {
    format!(
        r#"Generate exactly {count} multiple choice questions about "{topic}".

Format each question exactly like this:
Q1. Question text here
a) Option A
b) Option B
c) Option C
d) Option D
Answer: a

Follow this exact format for all {count} questions. Number them Q1, Q2, Q3 etc.
Do not add any extra text before or after the questions."#,
        count = request.count,
        topic = request.topic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_trims_and_strips_tags() {
        let request = GenerateRequest::new("  <b>Photosynthesis</b> <script>x</script> ", 5).unwrap();
        assert_eq!(request.topic, "Photosynthesis x");
    }

    #[test]
    fn request_truncates_long_topics() {
        let long = "a".repeat(800);
        let request = GenerateRequest::new(&long, 10).unwrap();
        assert_eq!(request.topic.chars().count(), MAX_TOPIC_CHARS);
    }

    #[test]
    fn request_rejects_empty_topic() {
        assert_eq!(GenerateRequest::new("   ", 5), Err(RequestError::EmptyTopic));
        assert_eq!(GenerateRequest::new("<br>", 5), Err(RequestError::EmptyTopic));
    }

    #[test]
    fn request_rejects_unlisted_count() {
        assert_eq!(
            GenerateRequest::new("Rust", 7),
            Err(RequestError::InvalidCount(7))
        );
        for count in ALLOWED_COUNTS {
            assert!(GenerateRequest::new("Rust", count).is_ok());
        }
    }

    #[test]
    fn prompt_mentions_topic_and_format() {
        let request = GenerateRequest::new("Newton's laws", 15).unwrap();
        let prompt = build_mcq_prompt(&request);
        assert!(prompt.contains("exactly 15 multiple choice questions"));
        assert!(prompt.contains("\"Newton's laws\""));
        assert!(prompt.contains("Answer: a"));
    }
}

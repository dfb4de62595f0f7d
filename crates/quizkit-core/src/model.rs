//! Core data model types for quizkit.
//!
//! These are the types the parser produces, the session tracks, and the
//! persistence collaborators exchange.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single parsed multiple-choice question. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question prompt, without its `Q<N>.` marker.
    pub text: String,
    /// Option labels exactly as emitted, letter prefix included (e.g. "a) Paris").
    pub options: Vec<String>,
    /// Lowercase answer key, or `None` when no usable answer line was present.
    #[serde(default)]
    pub correct_letter: Option<char>,
}

impl Question {
    /// Lowercase letter an option label starts with.
    pub fn option_letter(option: &str) -> Option<char> {
        option.chars().next().and_then(|c| c.to_lowercase().next())
    }

    /// Whether `option` is one of this question's labels.
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// The option whose letter matches the answer key, if exactly one does.
    ///
    /// Generated text occasionally names an answer letter that no option
    /// carries; that question is still playable but can never be correct.
    pub fn answer_option(&self) -> Option<&str> {
        let key = self.correct_letter?;
        let mut matching = self
            .options
            .iter()
            .filter(|o| Self::option_letter(o) == Some(key));
        match (matching.next(), matching.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }

    /// Whether `option` is the correct answer. Always false when the key is unknown.
    pub fn is_correct_option(&self, option: &str) -> bool {
        match self.correct_letter {
            Some(key) => Self::option_letter(option) == Some(key),
            None => false,
        }
    }
}

/// Interaction phase of a single question. Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Unanswered,
    Selected,
    Revealed,
}

/// Per-question interaction state, indexed by question position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionState {
    pub phase: Phase,
    /// Set when the question enters `Selected`.
    #[serde(default)]
    pub selected_option: Option<String>,
    /// Frozen at the `Revealed` transition.
    #[serde(default)]
    pub is_correct: Option<bool>,
}

/// Persistence status of a quiz session's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    NotSaved,
    Saving,
    Saved,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::NotSaved => write!(f, "not saved"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
        }
    }
}

/// Payload handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub topic: String,
    pub score: u32,
    pub total: u32,
}

/// Kind of a persisted history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Explain,
    Mcq,
    McqScore,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Explain => write!(f, "explain"),
            HistoryKind::Mcq => write!(f, "mcq"),
            HistoryKind::McqScore => write!(f, "mcq_score"),
        }
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "explain" => Ok(HistoryKind::Explain),
            "mcq" => Ok(HistoryKind::Mcq),
            "mcq_score" | "score" => Ok(HistoryKind::McqScore),
            other => Err(format!("unknown history kind: {other}")),
        }
    }
}

/// One persisted interaction, as listed by a history service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub topic: String,
    /// Generated text, or "Scored N/M" for score records.
    pub response: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept RFC 3339 timestamps as well as the naive ISO-8601 form the
/// backend emits for UTC values.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

impl HistoryEntry {
    /// Build the record stored for a saved score.
    pub fn from_submission(id: i64, submission: &ScoreSubmission) -> Self {
        Self {
            id,
            kind: HistoryKind::McqScore,
            topic: submission.topic.clone(),
            response: format!("Scored {}/{}", submission.score, submission.total),
            metadata: Some(serde_json::json!({
                "score": submission.score,
                "total": submission.total,
            })),
            created_at: Some(Utc::now()),
        }
    }

    /// `(score, total)` for score records with well-formed metadata.
    pub fn score(&self) -> Option<(u64, u64)> {
        if self.kind != HistoryKind::McqScore {
            return None;
        }
        let meta = self.metadata.as_ref()?;
        let score = meta.get("score")?.as_u64()?;
        let total = meta.get("total")?.as_u64()?;
        Some((score, total))
    }
}

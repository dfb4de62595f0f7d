//! One quiz attempt: parsed questions plus all interaction state.
//!
//! A session is created fresh from each generation response and replaced by
//! the next one. Every transition is a silent no-op when misused; the
//! presentation layer is expected to disable invalid controls, and the
//! session stays consistent regardless.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Phase, Question, QuestionState, SaveStatus, ScoreSubmission};
use crate::parser;

/// A single quiz attempt.
///
/// Serialized for rendering only. Sessions are built by [`QuizSession::initialize`]
/// so `questions` and `states` always have the same length.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSession {
    pub id: Uuid,
    pub topic: String,
    pub requested_count: u32,
    questions: Vec<Question>,
    /// Parallel to `questions`; position is the only key.
    states: Vec<QuestionState>,
    /// Unparsed text kept for verbatim display when nothing parsed.
    raw_text: Option<String>,
    save_status: SaveStatus,
    pub created_at: DateTime<Utc>,
}

impl QuizSession {
    /// Parse `raw` and build a session with every question unanswered.
    ///
    /// When nothing parses the session holds zero questions and keeps the raw
    /// text for fallback display. Such a session can never be saved.
    pub fn initialize(topic: &str, requested_count: u32, raw: &str) -> Self {
        let questions = parser::parse(raw);
        Self::from_questions(topic, requested_count, questions, raw)
    }

    /// Build a session from already parsed questions.
    pub fn from_questions(
        topic: &str,
        requested_count: u32,
        questions: Vec<Question>,
        raw: &str,
    ) -> Self {
        let raw_text = if questions.is_empty() {
            tracing::info!(topic, "no questions parsed, falling back to raw text");
            Some(raw.to_string())
        } else {
            for (index, question) in questions.iter().enumerate() {
                if question.answer_option().is_none() {
                    tracing::warn!(
                        index,
                        key = ?question.correct_letter,
                        "answer key does not match exactly one option"
                    );
                }
            }
            None
        };

        let states = vec![QuestionState::default(); questions.len()];
        Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            requested_count,
            questions,
            states,
            raw_text,
            save_status: SaveStatus::NotSaved,
            created_at: Utc::now(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn states(&self) -> &[QuestionState] {
        &self.states
    }

    pub fn question(&self, index: usize) -> Option<(&Question, &QuestionState)> {
        Some((self.questions.get(index)?, self.states.get(index)?))
    }

    /// Raw text to show verbatim, present only in fallback mode.
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    pub fn is_fallback(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Count of questions revealed and correct.
    pub fn score(&self) -> usize {
        self.states
            .iter()
            .filter(|s| s.phase == Phase::Revealed && s.is_correct == Some(true))
            .count()
    }

    /// Count of revealed questions.
    pub fn answered_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| s.phase == Phase::Revealed)
            .count()
    }

    /// Every question revealed. Never true for an empty session.
    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.answered_count() == self.questions.len()
    }

    /// Whether a save may start now.
    pub fn can_save(&self) -> bool {
        self.is_complete() && self.save_status == SaveStatus::NotSaved
    }

    /// Choose `option` for question `index`.
    ///
    /// Re-selecting a different option is allowed until the question is
    /// revealed. Returns whether the selection was applied.
    pub fn select(&mut self, index: usize, option: &str) -> bool {
        let (Some(question), Some(state)) = (self.questions.get(index), self.states.get_mut(index))
        else {
            tracing::debug!(index, "select ignored: no such question");
            return false;
        };
        if !question.has_option(option) {
            tracing::debug!(index, option, "select ignored: not an option of this question");
            return false;
        }
        if state.phase == Phase::Revealed {
            tracing::debug!(index, "select ignored: already revealed");
            return false;
        }
        state.phase = Phase::Selected;
        state.selected_option = Some(option.to_string());
        true
    }

    /// Reveal question `index`, freezing its correctness.
    ///
    /// Returns the correctness when the reveal applied, `None` when ignored
    /// (nothing selected yet or already revealed).
    pub fn reveal(&mut self, index: usize) -> Option<bool> {
        let question = self.questions.get(index)?;
        let state = self.states.get_mut(index)?;
        if state.phase != Phase::Selected {
            tracing::debug!(index, phase = ?state.phase, "reveal ignored");
            return None;
        }
        let correct = state
            .selected_option
            .as_deref()
            .is_some_and(|option| question.is_correct_option(option));
        state.is_correct = Some(correct);
        state.phase = Phase::Revealed;
        Some(correct)
    }

    /// Move to `Saving` and return the payload to persist.
    ///
    /// `None` when the quiz is incomplete, already saving, or already saved.
    pub fn begin_save(&mut self) -> Option<ScoreSubmission> {
        if !self.can_save() {
            return None;
        }
        self.save_status = SaveStatus::Saving;
        Some(self.submission())
    }

    /// Settle an in-flight save. A failure returns to `NotSaved` so the
    /// caller can retry.
    pub fn finish_save(&mut self, succeeded: bool) {
        if self.save_status != SaveStatus::Saving {
            tracing::debug!(status = %self.save_status, "finish_save ignored: no save in flight");
            return;
        }
        self.save_status = if succeeded {
            SaveStatus::Saved
        } else {
            SaveStatus::NotSaved
        };
    }

    /// Current score as a persistence payload.
    pub fn submission(&self) -> ScoreSubmission {
        ScoreSubmission {
            topic: self.topic.clone(),
            score: self.score() as u32,
            total: self.total() as u32,
        }
    }
}

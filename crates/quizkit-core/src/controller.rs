//! Quiz session controller.
//!
//! Owns the current [`QuizSession`], routes generation responses into it,
//! and coordinates the at-most-once score save with the persistence
//! collaborator.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{classify, RequestError};
use crate::model::{SaveStatus, ScoreSubmission};
use crate::session::QuizSession;
use crate::traits::{GenerateRequest, QuizGenerator, ScoreStore};

/// Identifies one generation request. Only the most recent ticket may
/// install a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub request: GenerateRequest,
}

/// What happened to a generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// A new session was installed.
    Applied,
    /// The generation failed; the message is meant for the user.
    Failed(String),
    /// The response belongs to a superseded request and was discarded.
    Stale,
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ScoreSubmission),
    AlreadySaved,
    InProgress,
    /// No session, fallback mode, or questions left unrevealed.
    NotReady,
    /// Persistence failed; the session is back to `NotSaved`.
    Failed(String),
}

/// Drives one quiz view: generation, interaction, and saving.
pub struct QuizController {
    generator: Arc<dyn QuizGenerator>,
    store: Arc<dyn ScoreStore>,
    active_seq: u64,
    pending: bool,
    session: Option<QuizSession>,
    last_error: Option<String>,
}

impl QuizController {
    pub fn new(generator: Arc<dyn QuizGenerator>, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            generator,
            store,
            active_seq: 0,
            pending: false,
            session: None,
            last_error: None,
        }
    }

    /// The current session, if one has been installed.
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// Last user-facing generation or save error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a generation request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Start a new generation request, superseding any outstanding one.
    ///
    /// The previous session stays readable until a response is applied.
    pub fn begin_request(&mut self, topic: &str, count: u32) -> Result<RequestTicket, RequestError> {
        let request = GenerateRequest::new(topic, count).inspect_err(|e| {
            self.last_error = Some(e.to_string());
        })?;
        self.active_seq += 1;
        self.pending = true;
        self.last_error = None;
        tracing::debug!(seq = self.active_seq, topic = %request.topic, "generation request started");
        Ok(RequestTicket {
            seq: self.active_seq,
            request,
        })
    }

    /// Apply a generation response if `ticket` is still the active request.
    pub fn apply_response(
        &mut self,
        ticket: &RequestTicket,
        response: anyhow::Result<String>,
    ) -> ResponseOutcome {
        if ticket.seq != self.active_seq || !self.pending {
            tracing::warn!(
                seq = ticket.seq,
                active = self.active_seq,
                "discarding response for superseded request"
            );
            return ResponseOutcome::Stale;
        }
        self.pending = false;

        match response {
            Ok(raw) => {
                let session =
                    QuizSession::initialize(&ticket.request.topic, ticket.request.count, &raw);
                tracing::info!(
                    topic = %session.topic,
                    parsed = session.total(),
                    requested = ticket.request.count,
                    "quiz session ready"
                );
                self.session = Some(session);
                ResponseOutcome::Applied
            }
            Err(e) => {
                let (kind, message) = classify(&e);
                tracing::error!(?kind, "generation failed: {e:#}");
                self.session = None;
                self.last_error = Some(message.clone());
                ResponseOutcome::Failed(message)
            }
        }
    }

    /// Request generated text and install it as the new session.
    pub async fn generate(&mut self, topic: &str, count: u32) -> Result<ResponseOutcome, RequestError> {
        let ticket = self.begin_request(topic, count)?;
        let response = self.generator.generate(&ticket.request).await;
        Ok(self.apply_response(&ticket, response))
    }

    /// The session open for interaction. Read-only while a request is outstanding.
    fn active_session(&mut self) -> Option<&mut QuizSession> {
        if self.pending {
            tracing::debug!("session is read-only while a request is outstanding");
            return None;
        }
        self.session.as_mut()
    }

    /// Select an option on the current session. See [`QuizSession::select`].
    pub fn select(&mut self, index: usize, option: &str) -> bool {
        self.active_session()
            .is_some_and(|s| s.select(index, option))
    }

    /// Reveal a question on the current session. See [`QuizSession::reveal`].
    pub fn reveal(&mut self, index: usize) -> Option<bool> {
        self.active_session()?.reveal(index)
    }

    /// Persist the score once every question is revealed.
    ///
    /// Calls the store at most once per successful save; after success every
    /// further call is a no-op. Failures leave the session retryable.
    pub async fn try_save_score(&mut self) -> SaveOutcome {
        let Some(session) = self.active_session() else {
            return SaveOutcome::NotReady;
        };
        match session.save_status() {
            SaveStatus::Saved => return SaveOutcome::AlreadySaved,
            SaveStatus::Saving => return SaveOutcome::InProgress,
            SaveStatus::NotSaved => {}
        }
        let Some(submission) = session.begin_save() else {
            return SaveOutcome::NotReady;
        };

        let result = self.store.save_score(&submission).await;

        // The session may have been replaced while the save was in flight.
        let Some(session) = self.session.as_mut() else {
            return SaveOutcome::NotReady;
        };
        match result {
            Ok(()) => {
                session.finish_save(true);
                tracing::info!(
                    topic = %submission.topic,
                    score = submission.score,
                    total = submission.total,
                    "score saved"
                );
                SaveOutcome::Saved(submission)
            }
            Err(e) => {
                session.finish_save(false);
                tracing::warn!("failed to save score: {e:#}");
                let message = "Failed to save score. Try again.".to_string();
                self.last_error = Some(message.clone());
                SaveOutcome::Failed(message)
            }
        }
    }
}

static PREFILL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(generate|quiz me on|create|make)\s+(\d+\s+)?(mcqs?|questions?|quiz)\s+(on|about)?\s*")
        .expect("valid regex")
});

static PREFILL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+with\s+\d+\s+questions?$").expect("valid regex"));

/// Reduce a conversational request ("generate 5 questions on X") to its topic.
///
/// Returns the input unchanged when cleaning would leave nothing.
pub fn clean_prefill_topic(raw: &str) -> String {
    let without_prefix = PREFILL_PREFIX.replace(raw, "");
    let cleaned = PREFILL_SUFFIX.replace(&without_prefix, "").trim().to_string();
    if cleaned.is_empty() {
        raw.to_string()
    } else {
        cleaned
    }
}

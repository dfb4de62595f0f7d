//! Mock collaborators for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizkit_core::error::GenerationError;
use quizkit_core::model::{HistoryEntry, ScoreSubmission};
use quizkit_core::traits::{GenerateRequest, HistoryStore, QuizGenerator, ScoreStore};

/// A mock generator that returns canned quiz text without network calls.
///
/// Responses are chosen by topic substring.
pub struct MockGenerator {
    /// Map of topic substring → raw quiz text.
    responses: HashMap<String, String>,
    /// Default response if no topic matches.
    default_response: String,
    /// Error to return instead of text, if set.
    failure: Mutex<Option<GenerationError>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    /// Create a mock with the given topic→text mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: String::new(),
            failure: Mutex::new(None),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: GenerationError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Get the number of calls made to this generator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this generator.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error.into());
        }

        Ok(self
            .responses
            .iter()
            .find(|(key, _)| request.topic.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

/// A mock store that keeps submissions in memory.
#[derive(Default)]
pub struct MockScoreStore {
    saved: Mutex<Vec<ScoreSubmission>>,
    failures_remaining: AtomicU32,
    call_count: AtomicU32,
}

impl MockScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` saves fail.
    pub fn fail_times(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn saved(&self) -> Vec<ScoreSubmission> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreStore for MockScoreStore {
    async fn save_score(&self, submission: &ScoreSubmission) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("mock store failure");
        }
        self.saved.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MockScoreStore {
    async fn list_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .enumerate()
            .rev()
            .map(|(i, s)| HistoryEntry::from_submission(i as i64 + 1, s))
            .collect())
    }
}

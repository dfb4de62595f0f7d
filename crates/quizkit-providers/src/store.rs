//! Local JSON history file.
//!
//! Offline stand-in for the backend's history table: scores and generated
//! quizzes are appended to a single JSON array on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use quizkit_core::model::{HistoryEntry, HistoryKind, ScoreSubmission};
use quizkit_core::traits::{HistoryStore, ScoreStore};

use crate::error::StoreError;

/// History persisted as a JSON array in one file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a generated quiz so it shows up in history and statistics.
    pub async fn record_generation(
        &self,
        topic: &str,
        count: u32,
        raw: &str,
    ) -> Result<HistoryEntry, StoreError> {
        self.append(|id| HistoryEntry {
            id,
            kind: HistoryKind::Mcq,
            topic: topic.to_string(),
            response: raw.to_string(),
            metadata: Some(serde_json::json!({ "count": count })),
            created_at: Some(chrono::Utc::now()),
        })
        .await
    }

    async fn read_entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(&self, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        // The target is only ever replaced whole, by rename.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn append(
        &self,
        build: impl FnOnce(i64) -> HistoryEntry,
    ) -> Result<HistoryEntry, StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = build(next_id);
        entries.push(entry.clone());
        self.write_entries(&entries).await?;
        tracing::debug!(id = entry.id, kind = %entry.kind, path = %self.path.display(), "history entry written");
        Ok(entry)
    }
}

#[async_trait]
impl ScoreStore for JsonFileStore {
    async fn save_score(&self, submission: &ScoreSubmission) -> anyhow::Result<()> {
        self.append(|id| HistoryEntry::from_submission(id, submission))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn list_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

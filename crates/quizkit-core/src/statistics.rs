//! Learning statistics over persisted history.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, HistoryKind};

/// Each history entry stands in for this many minutes of study.
const MINUTES_PER_ENTRY: usize = 3;

/// Aggregate learning statistics for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStats {
    /// Distinct topics explained or quizzed.
    pub topics_learned: usize,
    /// Generated quizzes.
    pub quizzes_generated: usize,
    /// Correct answers over all saved scores, as a rounded percentage.
    pub accuracy_percent: u32,
    /// Estimated study time, e.g. "1h 12m".
    pub time_spent: String,
}

/// Compute statistics from a user's history.
pub fn compute_learning_stats(entries: &[HistoryEntry]) -> LearningStats {
    let topics_learned = entries
        .iter()
        .filter(|e| matches!(e.kind, HistoryKind::Explain | HistoryKind::Mcq))
        .map(|e| e.topic.as_str())
        .collect::<HashSet<_>>()
        .len();

    let quizzes_generated = entries
        .iter()
        .filter(|e| e.kind == HistoryKind::Mcq)
        .count();

    // Score records with malformed metadata are skipped.
    let (correct, total) = entries
        .iter()
        .filter_map(HistoryEntry::score)
        .fold((0u64, 0u64), |(c, t), (score, total)| (c + score, t + total));
    let accuracy_percent = if total > 0 {
        ((correct as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };

    LearningStats {
        topics_learned,
        quizzes_generated,
        accuracy_percent,
        time_spent: format_minutes(entries.len() * MINUTES_PER_ENTRY),
    }
}

fn format_minutes(minutes: usize) -> String {
    if minutes >= 60 {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if mins > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{hours}h")
        }
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: HistoryKind, topic: &str, meta: Option<serde_json::Value>) -> HistoryEntry {
        HistoryEntry {
            id: 0,
            kind,
            topic: topic.into(),
            response: String::new(),
            metadata: meta,
            created_at: None,
        }
    }

    #[test]
    fn empty_history() {
        let stats = compute_learning_stats(&[]);
        assert_eq!(stats.topics_learned, 0);
        assert_eq!(stats.accuracy_percent, 0);
        assert_eq!(stats.time_spent, "0m");
    }

    #[test]
    fn mixed_history() {
        let entries = vec![
            entry(HistoryKind::Explain, "Gravity", None),
            entry(HistoryKind::Mcq, "Gravity", None),
            entry(HistoryKind::Mcq, "Rust", None),
            entry(
                HistoryKind::McqScore,
                "Rust",
                Some(serde_json::json!({"score": 3, "total": 5})),
            ),
            entry(
                HistoryKind::McqScore,
                "Gravity",
                Some(serde_json::json!({"score": 4, "total": 5})),
            ),
            entry(HistoryKind::McqScore, "Broken", Some(serde_json::json!({"score": "x"}))),
        ];
        let stats = compute_learning_stats(&entries);
        assert_eq!(stats.topics_learned, 2);
        assert_eq!(stats.quizzes_generated, 2);
        assert_eq!(stats.accuracy_percent, 70);
        assert_eq!(stats.time_spent, "18m");
    }

    #[test]
    fn minutes_formatting() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h");
        assert_eq!(format_minutes(75), "1h 15m");
    }
}

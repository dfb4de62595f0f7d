//! The `quizkit history` command.

use std::path::PathBuf;

use anyhow::Result;

use quizkit_core::model::{HistoryEntry, HistoryKind};
use quizkit_core::statistics::compute_learning_stats;
use quizkit_providers::{create_store, load_config_from};

const PREVIEW_CHARS: usize = 40;

pub async fn execute(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let stores = create_store(&config)?;

    let entries = stores.history.list_history().await?;
    let stats = compute_learning_stats(&entries);

    if json {
        let out = serde_json::json!({
            "stats": stats,
            "history": entries,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history yet. Run `quizkit play --topic <topic>` to take a quiz.");
        return Ok(());
    }

    print_table(&entries);

    println!("\nTopics learned:    {}", stats.topics_learned);
    println!("Quizzes generated: {}", stats.quizzes_generated);
    println!("Accuracy:          {}%", stats.accuracy_percent);
    println!("Time spent:        {}", stats.time_spent);

    Ok(())
}

fn print_table(entries: &[HistoryEntry]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Topic", "Result", "Date"]);

    for entry in entries {
        let result = match (entry.kind, entry.score()) {
            (HistoryKind::McqScore, Some((score, total))) => format!("{score}/{total}"),
            _ => preview(&entry.response),
        };
        let date = entry
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.kind),
            Cell::new(&entry.topic),
            Cell::new(result),
            Cell::new(date),
        ]);
    }

    println!("{table}");
}

/// First line of a response, shortened for a table cell.
fn preview(response: &str) -> String {
    let line = response.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let short: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{short}...")
    } else {
        line.to_string()
    }
}

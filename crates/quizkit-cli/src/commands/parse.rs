//! The `quizkit parse` command.

use std::path::PathBuf;

use anyhow::Result;

use quizkit_core::parser;

pub fn execute(input: PathBuf, count: Option<u32>, json: bool) -> Result<()> {
    let raw = parser::load_raw(&input)?;
    let questions = parser::parse(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No questions could be parsed. Raw text follows:\n");
        println!("{raw}");
        return Ok(());
    }

    println!("Parsed {} question(s)", questions.len());
    for (i, question) in questions.iter().enumerate() {
        println!("\nQ{}. {}", i + 1, question.text);
        for option in &question.options {
            let marker = if question.is_correct_option(option) {
                "*"
            } else {
                " "
            };
            println!("  {marker} {option}");
        }
    }

    let warnings = parser::validate_questions(&questions, count);
    for w in &warnings {
        let prefix = w
            .question_index
            .map(|i| format!("  [Q{}]", i + 1))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
    if !warnings.is_empty() {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

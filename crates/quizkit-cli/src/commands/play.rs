//! The `quizkit play` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use quizkit_core::controller::{clean_prefill_topic, QuizController, ResponseOutcome, SaveOutcome};
use quizkit_core::model::Question;
use quizkit_core::parser;
use quizkit_core::traits::{GenerateRequest, QuizGenerator};
use quizkit_providers::store::JsonFileStore;
use quizkit_providers::{create_generator, create_store, load_config_from, StoreConfig};

/// Replays previously generated quiz text from a file.
struct ReplayGenerator {
    path: PathBuf,
}

#[async_trait]
impl QuizGenerator for ReplayGenerator {
    fn name(&self) -> &str {
        "replay"
    }

    async fn generate(&self, _request: &GenerateRequest) -> anyhow::Result<String> {
        parser::load_raw(&self.path)
    }
}

pub async fn execute(
    topic: String,
    count: Option<u32>,
    input: Option<PathBuf>,
    no_save: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let count = count.unwrap_or(config.default_count);
    let topic = clean_prefill_topic(&topic);

    let replaying = input.is_some();
    let generator: Arc<dyn QuizGenerator> = match input {
        Some(path) => Arc::new(ReplayGenerator { path }),
        None => create_generator(&config)?,
    };
    let stores = create_store(&config)?;
    let mut controller = QuizController::new(generator.clone(), stores.scores);

    eprintln!("Generating {count} questions on \"{topic}\" via {}...", generator.name());
    match controller.generate(&topic, count).await? {
        ResponseOutcome::Applied => {}
        ResponseOutcome::Failed(message) => anyhow::bail!("{message}"),
        ResponseOutcome::Stale => anyhow::bail!("generation response was discarded"),
    }

    let Some(session) = controller.session() else {
        anyhow::bail!("no quiz session was created");
    };

    // The backend records generations itself; the local file needs it done here.
    if let (StoreConfig::File { path }, false, false) = (&config.store, replaying, no_save) {
        let response = match session.raw_text() {
            Some(raw) => raw.to_string(),
            None => serde_json::to_string(session.questions())?,
        };
        JsonFileStore::new(path.clone())
            .record_generation(&session.topic, count, &response)
            .await?;
    }

    if session.is_fallback() {
        println!("Could not parse any questions. Raw response:\n");
        println!("{}", session.raw_text().unwrap_or_default());
        return Ok(());
    }

    let questions: Vec<Question> = session.questions().to_vec();
    let total = questions.len();
    if total != count as usize {
        eprintln!("Note: requested {count} questions, got {total}.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    for (index, question) in questions.iter().enumerate() {
        println!("\nQuestion {} of {total}", index + 1);
        println!("{}", question.text);
        for option in &question.options {
            println!("  {option}");
        }

        loop {
            print!("Choose a letter, or press Enter to check: ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                let answered = controller.session().map_or(0, |s| s.answered_count());
                println!("\nQuiz ended early: answered {answered} of {total}.");
                return Ok(());
            };
            let choice = line?.trim().to_string();

            if choice.is_empty() {
                match controller.reveal(index) {
                    Some(true) => {
                        println!("Correct! Well done.");
                        break;
                    }
                    Some(false) => {
                        println!("The correct answer is: {}", answer_label(question));
                        break;
                    }
                    None => println!("Select an option first."),
                }
                continue;
            }

            let letter = Question::option_letter(&choice);
            let option = question
                .options
                .iter()
                .find(|o| Question::option_letter(o) == letter);
            match option {
                Some(option) if controller.select(index, option) => {
                    println!("Selected: {option}");
                }
                _ => println!("No option '{choice}'."),
            }
        }
    }

    if let Some(session) = controller.session() {
        println!("\nScore: {}/{}", session.score(), session.total());
    }

    if no_save {
        println!("Score not saved (--no-save).");
        return Ok(());
    }

    loop {
        match controller.try_save_score().await {
            SaveOutcome::Saved(submission) => {
                println!("Score saved: {}/{}", submission.score, submission.total);
                break;
            }
            SaveOutcome::AlreadySaved => {
                println!("Score saved.");
                break;
            }
            SaveOutcome::InProgress | SaveOutcome::NotReady => break,
            SaveOutcome::Failed(message) => {
                println!("{message}");
                print!("Retry? [y/N]: ");
                io::stdout().flush()?;
                let retry = match lines.next() {
                    Some(line) => line?.trim().eq_ignore_ascii_case("y"),
                    None => false,
                };
                if !retry {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Uppercase answer letter, or a placeholder when the key is unknown.
fn answer_label(question: &Question) -> String {
    question
        .correct_letter
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

//! quizkit CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizkit", version, about = "Parse, play, and score AI-generated quizzes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse raw quiz text offline
    Parse {
        /// File with raw generated quiz text
        #[arg(long)]
        input: PathBuf,

        /// Number of questions that were requested (enables a count check)
        #[arg(long)]
        count: Option<u32>,

        /// Print parsed questions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a quiz and answer it interactively
    Play {
        /// Quiz topic
        #[arg(long)]
        topic: String,

        /// Number of questions: 5, 10, 15, or 20
        #[arg(long)]
        count: Option<u32>,

        /// Replay raw quiz text from a file instead of calling the generator
        #[arg(long)]
        input: Option<PathBuf>,

        /// Do not persist the score
        #[arg(long)]
        no_save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show saved quiz attempts and learning statistics
    History {
        /// Print entries and statistics as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizkit=info".parse().unwrap())
                .add_directive("quizkit_core=warn".parse().unwrap())
                .add_directive("quizkit_providers=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, count, json } => commands::parse::execute(input, count, json),
        Commands::Play {
            topic,
            count,
            input,
            no_save,
            config,
        } => commands::play::execute(topic, count, input, no_save, config).await,
        Commands::History { json, config } => commands::history::execute(json, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

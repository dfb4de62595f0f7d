//! The `quizkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizkit.toml").exists() {
        println!("quizkit.toml already exists, skipping.");
    } else {
        std::fs::write("quizkit.toml", SAMPLE_CONFIG)?;
        println!("Created quizkit.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point [api] at your backend, or switch [generator] to gemini");
    println!("  2. Run: quizkit play --topic \"Photosynthesis\"");
    println!("  3. Run: quizkit history");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizkit configuration

default_count = 5

[api]
base_url = "http://localhost:5000/api"
# token = "${QUIZKIT_API_TOKEN}"

# Generate through the backend. To call Gemini directly instead:
#   type = "gemini"
#   api_key = "${GEMINI_API_KEY}"
[generator]
type = "api"

[store]
type = "file"
path = "./quizkit-history.json"
"#;

//! Configuration and collaborator factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizkit_core::traits::{HistoryStore, QuizGenerator, ScoreStore};

use crate::api::ApiClient;
use crate::gemini::GeminiGenerator;
use crate::store::JsonFileStore;

/// Where quiz text comes from.
///
/// Note: Custom Debug impl masks secrets to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    /// The learning-app backend (`POST /mcq`).
    Api,
    /// The Gemini API called directly.
    Gemini {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorConfig::Api => f.debug_struct("Api").finish(),
            GeneratorConfig::Gemini {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Where scores and history are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// The learning-app backend (`POST /mcq/score`, `GET /history`).
    Api,
    /// A local JSON file.
    File {
        #[serde(default = "default_history_path")]
        path: PathBuf,
    },
}

/// Learning-app API connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    /// Bearer token from a login.
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            token: None,
        }
    }
}

/// Top-level quizkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizkitConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_generator")]
    pub generator: GeneratorConfig,
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    /// Question count used when none is given.
    #[serde(default = "default_count")]
    pub default_count: u32,
}

fn default_api_url() -> String {
    crate::api::DEFAULT_BASE_URL.to_string()
}
fn default_generator() -> GeneratorConfig {
    GeneratorConfig::Api
}
fn default_store() -> StoreConfig {
    StoreConfig::File {
        path: default_history_path(),
    }
}
fn default_history_path() -> PathBuf {
    PathBuf::from("./quizkit-history.json")
}
fn default_count() -> u32 {
    5
}

impl Default for QuizkitConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            generator: default_generator(),
            store: default_store(),
            default_count: default_count(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied as-is and never expanded again. An
/// unterminated `${` is kept literally.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + 2 + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + 2 + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizkit.toml` in the current directory
/// 2. `~/.config/quizkit/config.toml`
///
/// Environment variable overrides: `QUIZKIT_API_URL`, `QUIZKIT_API_TOKEN`,
/// `QUIZKIT_GEMINI_KEY`.
pub fn load_config() -> Result<QuizkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizkitConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("QUIZKIT_API_URL") {
        config.api.base_url = url;
    }
    if let Ok(token) = std::env::var("QUIZKIT_API_TOKEN") {
        config.api.token = Some(token);
    }
    if let Ok(key) = std::env::var("QUIZKIT_GEMINI_KEY") {
        match &mut config.generator {
            GeneratorConfig::Gemini { api_key, .. } => *api_key = key,
            GeneratorConfig::Api => {
                config.generator = GeneratorConfig::Gemini {
                    api_key: key,
                    model: None,
                    base_url: None,
                }
            }
        }
    }

    // Resolve env vars in secrets and URLs
    config.api.base_url = resolve_env_vars(&config.api.base_url);
    config.api.token = config.api.token.as_deref().map(resolve_env_vars);
    if let GeneratorConfig::Gemini {
        api_key, base_url, ..
    } = &mut config.generator
    {
        *api_key = resolve_env_vars(api_key);
        *base_url = base_url.as_deref().map(resolve_env_vars);
    }

    anyhow::ensure!(
        quizkit_core::traits::ALLOWED_COUNTS.contains(&config.default_count),
        "default_count must be one of {:?}",
        quizkit_core::traits::ALLOWED_COUNTS
    );

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizkit"))
}

/// Create the configured quiz generator.
pub fn create_generator(config: &QuizkitConfig) -> Result<Arc<dyn QuizGenerator>> {
    match &config.generator {
        GeneratorConfig::Api => Ok(Arc::new(ApiClient::new(
            Some(config.api.base_url.clone()),
            config.api.token.clone(),
        )?)),
        GeneratorConfig::Gemini {
            api_key,
            model,
            base_url,
        } => {
            anyhow::ensure!(!api_key.is_empty(), "gemini generator requires an api_key");
            Ok(Arc::new(GeminiGenerator::new(
                api_key,
                model.clone(),
                base_url.clone(),
            )?))
        }
    }
}

/// The configured store, shared between score saving and history listing.
#[derive(Clone)]
pub struct StoreHandles {
    pub scores: Arc<dyn ScoreStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl StoreHandles {
    fn from_store<T: ScoreStore + HistoryStore + 'static>(store: T) -> Self {
        let store = Arc::new(store);
        Self {
            scores: store.clone(),
            history: store,
        }
    }
}

/// Create the configured score/history store.
pub fn create_store(config: &QuizkitConfig) -> Result<StoreHandles> {
    match &config.store {
        StoreConfig::Api => Ok(StoreHandles::from_store(ApiClient::new(
            Some(config.api.base_url.clone()),
            config.api.token.clone(),
        )?)),
        StoreConfig::File { path } => Ok(StoreHandles::from_store(JsonFileStore::new(
            path.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_QUIZKIT_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_substituted_values() {
        std::env::set_var("_QUIZKIT_TEST_SELF", "${_QUIZKIT_TEST_SELF}");
        std::env::set_var("_QUIZKIT_TEST_NESTED", "a${_QUIZKIT_TEST_SELF}b");
        assert_eq!(
            resolve_env_vars("${_QUIZKIT_TEST_SELF}"),
            "${_QUIZKIT_TEST_SELF}"
        );
        assert_eq!(
            resolve_env_vars("x-${_QUIZKIT_TEST_NESTED}-y"),
            "x-a${_QUIZKIT_TEST_SELF}b-y"
        );
        std::env::remove_var("_QUIZKIT_TEST_SELF");
        std::env::remove_var("_QUIZKIT_TEST_NESTED");
    }

    #[test]
    fn resolve_env_vars_edge_cases() {
        assert_eq!(resolve_env_vars("no refs"), "no refs");
        assert_eq!(resolve_env_vars("open ${NEVER_CLOSED"), "open ${NEVER_CLOSED");
        assert_eq!(resolve_env_vars("${_QUIZKIT_TEST_UNSET_VAR}!"), "!");
        assert_eq!(resolve_env_vars("$}{"), "$}{");
    }

    #[test]
    fn default_config() {
        let config = QuizkitConfig::default();
        assert!(matches!(config.generator, GeneratorConfig::Api));
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert_eq!(config.default_count, 5);
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
default_count = 10

[api]
base_url = "https://learn.example.com/api"
token = "abc"

[generator]
type = "gemini"
api_key = "g-key"
model = "gemini-2.5-pro"

[store]
type = "api"
"#;
        let config: QuizkitConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_count, 10);
        assert!(matches!(
            config.generator,
            GeneratorConfig::Gemini { ref model, .. } if model.as_deref() == Some("gemini-2.5-pro")
        ));
        assert!(matches!(config.store, StoreConfig::Api));
    }

    #[test]
    fn debug_masks_secrets() {
        let config: QuizkitConfig = toml::from_str(
            r#"
[api]
token = "super-secret-token"

[generator]
type = "gemini"
api_key = "super-secret-key"
"#,
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizkit.toml");
        std::fs::write(
            &path,
            "default_count = 15\n[store]\ntype = \"file\"\npath = \"scores.json\"\n",
        )
        .unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_count, 15);
        assert!(matches!(
            config.store,
            StoreConfig::File { ref path } if path == Path::new("scores.json")
        ));
    }

    #[test]
    fn rejects_unlisted_default_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizkit.toml");
        std::fs::write(&path, "default_count = 7\n").unwrap();
        assert!(load_config_from(Some(&path)).is_err());
    }

    #[test]
    fn missing_explicit_path_is_error() {
        assert!(load_config_from(Some(Path::new("/nonexistent/quizkit.toml"))).is_err());
    }

    #[test]
    fn factories_build_collaborators() {
        let config = QuizkitConfig::default();
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "api");
        assert!(create_store(&config).is_ok());

        let gemini = QuizkitConfig {
            generator: GeneratorConfig::Gemini {
                api_key: String::new(),
                model: None,
                base_url: None,
            },
            ..QuizkitConfig::default()
        };
        assert!(create_generator(&gemini).is_err());
    }
}

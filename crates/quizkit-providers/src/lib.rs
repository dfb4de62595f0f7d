//! quizkit-providers — Generation and persistence backends.
//!
//! Implements the `QuizGenerator`, `ScoreStore`, and `HistoryStore` traits
//! for the learning-app HTTP API, a direct Gemini client, a local JSON file,
//! and in-memory mocks.

pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod store;

pub use config::{
    create_generator, create_store, load_config, load_config_from, QuizkitConfig, StoreConfig,
    StoreHandles,
};
pub use error::StoreError;

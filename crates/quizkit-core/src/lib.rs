//! quizkit-core — Quiz parsing, session state, and scoring.
//!
//! This crate turns free-form generated quiz text into structured questions,
//! drives each question through its answer/reveal lifecycle, and coordinates
//! the single score save at the end of a quiz attempt.

pub mod controller;
pub mod error;
pub mod model;
pub mod parser;
pub mod session;
pub mod statistics;
pub mod traits;

//! # EchoChat Core
//!
//! Pure logic for EchoChat: chat-log normalization, speaker style
//! profiling, TF-IDF retrieval, conversation history, and prompt
//! composition, plus the [`completion::CompletionProvider`] trait that
//! language-model backends implement.
//!
//! This crate contains no tokio, HTTP client, or filesystem I/O. Every
//! function is deterministic for a given input.

pub mod completion;
pub mod history;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod retrieve;
pub mod style;
pub mod tfidf;

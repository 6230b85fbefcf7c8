//! Language-model completion trait.
//!
//! Defines the [`CompletionProvider`] capability that every backend
//! implements. A provider offers both a blocking completion that returns
//! the whole reply and a streaming completion that yields text fragments
//! as they arrive. Concrete providers (Ollama, Gemini) live in the
//! `echochat` app crate.

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

/// A lazy, finite sequence of reply fragments.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// How a reply is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// One call, one complete string.
    Blocking,
    /// Fragments forwarded as they arrive.
    #[default]
    Streaming,
}

impl GenerationMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            GenerationMode::Streaming
        } else {
            GenerationMode::Blocking
        }
    }
}

/// Trait for text-completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"llama3.1:8b"`).
    fn model_name(&self) -> &str;

    /// Generate a complete reply.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Generate a reply as a stream of fragments.
    async fn complete_stream(&self, system: &str, user: &str) -> Result<ChunkStream>;
}

//! Chat-log ingestion.
//!
//! Reads an exported chat log from disk and runs it through the
//! [`LogNormalizer`](echochat_core::normalize::LogNormalizer). A missing
//! or unreadable file is fatal; everything after that is best-effort.

use anyhow::{Context, Result};
use std::path::Path;

use echochat_core::models::ChatMessage;

use crate::config::Config;

/// Read the raw lines of a chat log.
pub fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chat log: {}", path.display()))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    Ok(content.lines().map(str::to_string).collect())
}

/// Read and normalize a chat log into a corpus.
pub fn load_corpus(config: &Config, path: &Path) -> Result<Vec<ChatMessage>> {
    let lines = read_log_lines(path)?;
    let corpus = config.normalizer.normalizer().normalize(&lines);

    tracing::info!(
        path = %path.display(),
        lines = lines.len(),
        messages = corpus.len(),
        "normalized chat log"
    );

    Ok(corpus)
}

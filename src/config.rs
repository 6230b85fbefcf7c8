//! TOML configuration.
//!
//! Every section is optional; a missing config file yields
//! [`Config::default`]. See `config/echochat.example.toml` for all keys.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use echochat_core::history::DEFAULT_HISTORY_LIMIT;
use echochat_core::normalize::{LogNormalizer, DEFAULT_DENY_LIST};
use echochat_core::prompt::DEFAULT_SYSTEM_PROMPT;
use echochat_core::retrieve::{ReferenceStrategy, RetrievalParams};
use echochat_core::style::StyleParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizerConfig {
    #[serde(default = "default_deny_list")]
    pub deny_list: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            deny_list: default_deny_list(),
        }
    }
}

fn default_deny_list() -> Vec<String> {
    DEFAULT_DENY_LIST.iter().map(|s| s.to_string()).collect()
}

impl NormalizerConfig {
    pub fn normalizer(&self) -> LogNormalizer {
        LogNormalizer::new(self.deny_list.clone())
    }
}

/// Which style preset to start from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleVariant {
    /// Top 10 words, expressions kept in the word list.
    #[default]
    Interactive,
    /// Top 50 words, expressions filtered out of the word list.
    Advanced,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StyleConfig {
    #[serde(default)]
    pub variant: StyleVariant,
    #[serde(default)]
    pub top_words: Option<usize>,
    #[serde(default)]
    pub exclude_expressions: Option<bool>,
    #[serde(default)]
    pub fallback_avg_length: Option<usize>,
    #[serde(default)]
    pub expressions: Option<Vec<String>>,
}

impl StyleConfig {
    /// Preset for `variant` with any explicit overrides applied.
    pub fn params(&self) -> StyleParams {
        let mut params = match self.variant {
            StyleVariant::Interactive => StyleParams::interactive(),
            StyleVariant::Advanced => StyleParams::advanced(),
        };
        if let Some(k) = self.top_words {
            params.top_words = k;
        }
        if let Some(exclude) = self.exclude_expressions {
            params.exclude_expressions = exclude;
        }
        if let Some(fallback) = self.fallback_avg_length {
            params.fallback_avg_length = fallback;
        }
        if let Some(ref expressions) = self.expressions {
            params.expressions = expressions.clone();
        }
        params
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub strategy: ReferenceStrategy,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: ReferenceStrategy::default(),
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            strategy: self.strategy,
            top_n: self.top_n,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Language-model backend.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Gemini,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL override. Defaults per provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            url: None,
            stream: default_stream(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_stream() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    120
}

impl LlmConfig {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("no config at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.session.history_limit == 0 {
        anyhow::bail!("session.history_limit must be >= 1");
    }

    if config.retrieval.top_n == 0 {
        anyhow::bail!("retrieval.top_n must be >= 1");
    }

    if config.style.params().top_words == 0 {
        anyhow::bail!("style.top_words must be >= 1");
    }

    if config.llm.timeout_secs == 0 {
        anyhow::bail!("llm.timeout_secs must be >= 1");
    }

    if config.llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.session.history_limit, 5);
        assert_eq!(config.retrieval.top_n, 5);
        assert_eq!(config.retrieval.strategy, ReferenceStrategy::SpeakerHistory);
        assert_eq!(config.llm.provider, ProviderKind::Ollama);
        assert_eq!(config.llm.model, "llama3.1:8b");
        assert!(config.llm.stream);
        assert_eq!(config.style.params(), StyleParams::interactive());
        assert_eq!(config.normalizer.deny_list.len(), DEFAULT_DENY_LIST.len());
        assert_eq!(config.llm.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_advanced_variant_with_override() {
        let config = parse(
            r#"
[style]
variant = "advanced"
fallback_avg_length = 20
"#,
        )
        .unwrap();
        let params = config.style.params();
        assert_eq!(params.top_words, 50);
        assert!(params.exclude_expressions);
        assert_eq!(params.fallback_avg_length, 20);
    }

    #[test]
    fn test_reply_strategy_and_gemini() {
        let config = parse(
            r#"
[retrieval]
strategy = "reply"
top_n = 3

[llm]
provider = "gemini"
model = "gemini-2.0-flash-lite"
stream = false
"#,
        )
        .unwrap();
        assert_eq!(config.retrieval.params().strategy, ReferenceStrategy::ReplyFollowing);
        assert_eq!(config.retrieval.params().top_n, 3);
        assert_eq!(config.llm.provider, ProviderKind::Gemini);
        assert!(!config.llm.stream);
    }

    #[test]
    fn test_rejects_zero_history_limit() {
        let err = parse("[session]\nhistory_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("history_limit"));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        assert!(parse("[llm]\nprovider = \"gpt\"\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(parse("[retrieval]\nstrategy = \"both\"\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config =
            load_config_or_default(Path::new("/nonexistent/echochat.toml")).unwrap();
        assert_eq!(config.session.history_limit, 5);
    }
}

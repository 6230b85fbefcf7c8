//! `echochat speakers` and `echochat profile`.

use anyhow::Result;
use std::path::Path;

use echochat_core::models::{messages_by, speakers};
use echochat_core::style::compute_style_profile;

use crate::config::Config;
use crate::ingest;

/// List speakers in order of first appearance with message counts.
pub fn run_speakers(config: &Config, log: &Path) -> Result<()> {
    let corpus = ingest::load_corpus(config, log)?;

    if corpus.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    for (i, name) in speakers(&corpus).iter().enumerate() {
        println!("{}. {} ({} messages)", i, name, messages_by(&corpus, name).len());
    }

    Ok(())
}

/// Print the style profile of `speaker`.
pub fn run_profile(config: &Config, log: &Path, speaker: &str, json: bool) -> Result<()> {
    let corpus = ingest::load_corpus(config, log)?;
    let profile = compute_style_profile(&corpus, speaker, &config.style.params());

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("Speaker:         {}", speaker);
    println!("Messages:        {}", messages_by(&corpus, speaker).len());
    println!("Average length:  {}", profile.avg_length);
    println!("Top words:       {}", profile.top_words.join(", "));
    println!("Top expressions: {}", profile.top_expressions.join(", "));

    Ok(())
}

//! `echochat retrieve` and `echochat prompt`.
//!
//! Thin CLI wrappers around `echochat_core::retrieve` and the session's
//! prompt builder. Neither command calls a language model.

use anyhow::Result;
use std::path::Path;

use echochat_core::retrieve::{retrieve_scored, ReferenceStrategy, RetrievalParams};

use crate::config::Config;
use crate::ingest;
use crate::session::{Session, SessionSettings};

/// Print the messages that would be placed in the prompt for `query`.
pub fn run_retrieve(
    config: &Config,
    log: &Path,
    speaker: &str,
    query: &str,
    strategy: Option<ReferenceStrategy>,
    limit: Option<usize>,
    explain: bool,
) -> Result<()> {
    let corpus = ingest::load_corpus(config, log)?;

    let defaults = config.retrieval.params();
    let params = RetrievalParams {
        strategy: strategy.unwrap_or(defaults.strategy),
        top_n: limit.unwrap_or(defaults.top_n),
    };

    let results = retrieve_scored(&corpus, speaker, query, &params);

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, result.score, result.text);
        if explain && params.strategy == ReferenceStrategy::ReplyFollowing {
            println!("    in reply to: {}", result.matched);
        }
    }

    Ok(())
}

/// Print the composed system and user prompts for `input`.
pub fn run_prompt(config: &Config, log: &Path, speaker: &str, input: &str) -> Result<()> {
    let corpus = ingest::load_corpus(config, log)?;
    let mut session = Session::new(corpus, speaker, SessionSettings::from_config(config));
    let prompt = session.build_prompt(input);

    println!("[system]");
    println!("{}", prompt.system);
    println!();
    println!("[user]");
    println!("{}", prompt.user);

    Ok(())
}

//! # EchoChat CLI (`echochat`)
//!
//! ## Usage
//!
//! ```bash
//! echochat --config ./config/echochat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `echochat parse <log>` | Normalize a chat log into `Date,Time,Speaker,Message` rows |
//! | `echochat speakers <log>` | List speakers and message counts |
//! | `echochat profile <log> --speaker <name>` | Show a speaker's style profile |
//! | `echochat retrieve <log> --speaker <name> "<query>"` | Show retrieved context |
//! | `echochat prompt <log> --speaker <name> "<input>"` | Show the composed prompt |
//! | `echochat chat <log>` | Chat in a speaker's voice |
//!
//! ## Examples
//!
//! ```bash
//! # Export a cleaned CSV
//! echochat parse KakaoTalk_chat.txt --output cleaned.csv
//!
//! # What would 민수 draw on when asked about dinner?
//! echochat retrieve KakaoTalk_chat.txt --speaker 민수 "저녁 뭐 먹을래" --strategy reply --explain
//!
//! # Chat, picking the speaker interactively
//! echochat chat KakaoTalk_chat.txt
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use echochat::{chat, config, export, inspect, retrieve};
use echochat_core::retrieve::ReferenceStrategy;

/// EchoChat CLI: answer in the voice of someone from your chat history.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "echochat",
    about = "EchoChat: answer in the voice of someone from your chat history",
    version,
    long_about = "EchoChat parses exported chat logs, profiles a speaker's style, retrieves \
    their most similar past messages with TF-IDF, and prompts a language model (Ollama or Gemini) \
    to reply as that speaker."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/echochat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Normalize a chat log into tabular rows.
    ///
    /// Drops system events (photos, stickers, transfers, ...) and lines that
    /// are not date headers or messages.
    Parse {
        /// Exported chat log (UTF-8 text).
        log: PathBuf,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: `csv` or `json`.
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// List speakers with their message counts.
    Speakers {
        log: PathBuf,
    },

    /// Show a speaker's style profile.
    Profile {
        log: PathBuf,

        #[arg(long)]
        speaker: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Retrieve the past messages most similar to a query.
    Retrieve {
        log: PathBuf,

        #[arg(long)]
        speaker: String,

        /// The query text.
        query: String,

        /// Reference set: `speaker` (own messages) or `reply` (replies to
        /// similar lines from others). Defaults to `[retrieval].strategy`.
        #[arg(long)]
        strategy: Option<ReferenceStrategy>,

        /// Maximum number of results. Defaults to `[retrieval].top_n`.
        #[arg(long)]
        limit: Option<usize>,

        /// Show the matched line for `reply` results.
        #[arg(long)]
        explain: bool,
    },

    /// Print the prompt that would be sent for an input, without calling a model.
    Prompt {
        log: PathBuf,

        #[arg(long)]
        speaker: String,

        input: String,
    },

    /// Chat interactively in a speaker's voice.
    Chat {
        log: PathBuf,

        /// Speaker to imitate. Asked interactively when omitted.
        #[arg(long)]
        speaker: Option<String>,

        /// Number of recent turns kept in the prompt. Defaults to
        /// `[session].history_limit`.
        #[arg(long)]
        history_limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Parse {
            log,
            output,
            format,
        } => {
            export::run_parse(&cfg, &log, output.as_deref(), &format)?;
        }
        Commands::Speakers { log } => {
            inspect::run_speakers(&cfg, &log)?;
        }
        Commands::Profile { log, speaker, json } => {
            inspect::run_profile(&cfg, &log, &speaker, json)?;
        }
        Commands::Retrieve {
            log,
            speaker,
            query,
            strategy,
            limit,
            explain,
        } => {
            retrieve::run_retrieve(&cfg, &log, &speaker, &query, strategy, limit, explain)?;
        }
        Commands::Prompt {
            log,
            speaker,
            input,
        } => {
            retrieve::run_prompt(&cfg, &log, &speaker, &input)?;
        }
        Commands::Chat {
            log,
            speaker,
            history_limit,
        } => {
            chat::run_chat(&cfg, &log, speaker, history_limit).await?;
        }
    }

    Ok(())
}

//! Interactive chat loop (`echochat chat`).
//!
//! Reads user lines from stdin, answers in the selected speaker's voice,
//! and writes the reply to stdout, streamed or whole depending on
//! `[llm].stream`. An empty line, `/quit`, or end of input ends the loop.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use echochat_core::completion::GenerationMode;
use echochat_core::models::speakers;

use crate::completion::create_provider;
use crate::config::Config;
use crate::ingest;
use crate::session::{Session, SessionSettings};

type InputLines = Lines<BufReader<Stdin>>;

pub async fn run_chat(
    config: &Config,
    log: &Path,
    speaker: Option<String>,
    history_limit: Option<usize>,
) -> Result<()> {
    let corpus = ingest::load_corpus(config, log)?;
    let interactive = atty::is(atty::Stream::Stdin);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let speaker = match speaker {
        Some(name) => name,
        None => select_speaker(&speakers(&corpus), &mut input).await?,
    };

    let mut settings = SessionSettings::from_config(config);
    if let Some(limit) = history_limit {
        if limit == 0 {
            bail!("--history-limit must be >= 1");
        }
        settings.history_limit = limit;
    }

    let provider = create_provider(&config.llm)?;
    let mode = GenerationMode::from_stream_flag(config.llm.stream);
    let mut session = Session::new(corpus, speaker, settings);

    tracing::info!(
        speaker = session.speaker(),
        model = provider.model_name(),
        ?mode,
        "chat session started"
    );

    loop {
        if interactive {
            print!("사용자: ");
            std::io::stdout().flush()?;
        }

        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            break;
        }

        print!("{}: ", session.speaker());
        std::io::stdout().flush()?;

        let result = session
            .respond_with(provider.as_ref(), mode, line, |chunk| {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();

        if let Err(e) = result {
            eprintln!("Error: {:#}", e);
        }
    }

    Ok(())
}

/// Ask for a speaker index until a valid one is entered.
async fn select_speaker(names: &[String], input: &mut InputLines) -> Result<String> {
    if names.is_empty() {
        bail!("No speakers found in chat log");
    }

    for (i, name) in names.iter().enumerate() {
        println!("{}. {}", i, name);
    }

    loop {
        print!("💬 대화할 상대의 번호 입력: ");
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            bail!("No speaker selected");
        };

        match parse_selection(&line, names.len()) {
            Some(i) => return Ok(names[i].clone()),
            None => println!("잘못된 입력입니다. 대화할 상대의 번호를 입력하세요."),
        }
    }
}

fn parse_selection(line: &str, count: usize) -> Option<usize> {
    line.trim().parse::<usize>().ok().filter(|&i| i < count)
}

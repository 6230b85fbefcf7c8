//! Export a normalized chat log as delimited rows or JSON.
//!
//! The tabular form has four ordered columns, `Date,Time,Speaker,Message`,
//! with RFC 4180 quoting, and is what downstream tools persist.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;

use echochat_core::models::ChatMessage;

use crate::config::Config;
use crate::ingest;

pub const CSV_HEADER: &str = "Date,Time,Speaker,Message";

#[derive(Serialize)]
struct ExportRow<'a> {
    date: String,
    time: String,
    speaker: &'a str,
    message: &'a str,
}

impl<'a> From<&'a ChatMessage> for ExportRow<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            date: msg.date_string(),
            time: msg.time_string(),
            speaker: &msg.speaker,
            message: &msg.text,
        }
    }
}

/// Render messages as CSV, header included.
pub fn to_csv(messages: &[ChatMessage]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for msg in messages {
        let fields = [
            msg.date_string(),
            msg.time_string(),
            csv_field(&msg.speaker),
            csv_field(&msg.text),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Render messages as a pretty-printed JSON array.
pub fn to_json(messages: &[ChatMessage]) -> Result<String> {
    let rows: Vec<ExportRow<'_>> = messages.iter().map(ExportRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Normalize `log` and write it to `output` (or stdout).
pub fn run_parse(config: &Config, log: &Path, output: Option<&Path>, format: &str) -> Result<()> {
    let messages = ingest::load_corpus(config, log)?;

    let rendered = match format {
        "csv" => to_csv(&messages),
        "json" => to_json(&messages)?,
        other => bail!("Unknown export format: '{}'. Use csv or json.", other),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &rendered)?;
            eprintln!("Exported {} messages to {}", messages.len(), path.display());
        }
        None => {
            print!("{}", rendered);
        }
    }

    Ok(())
}

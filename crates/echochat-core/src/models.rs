//! Core data models shared by the normalizer, retriever, and session.
//!
//! A corpus is simply a `Vec<ChatMessage>` in original log order; the
//! helpers here partition it by speaker on demand.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// One message line of an exported chat log, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub speaker: String,
    pub text: String,
}

impl ChatMessage {
    /// Date in `YYYY-MM-DD` form.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Time in 24-hour `HH:MM` form.
    pub fn time_string(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Who produced a [`ConversationTurn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Speaker(String),
}

impl Role {
    /// `"user"` or the speaker's name.
    pub fn label(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Speaker(name) => name,
        }
    }
}

/// A single entry in the live conversation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn speaker(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Speaker(name.into()),
            content: content.into(),
        }
    }
}

/// Distinct speakers in order of first appearance.
pub fn speakers(corpus: &[ChatMessage]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for msg in corpus {
        if !seen.iter().any(|s| s == &msg.speaker) {
            seen.push(msg.speaker.clone());
        }
    }
    seen
}

/// Messages whose speaker matches `speaker` exactly, in corpus order.
pub fn messages_by<'a>(corpus: &'a [ChatMessage], speaker: &str) -> Vec<&'a ChatMessage> {
    corpus.iter().filter(|m| m.speaker == speaker).collect()
}

//! Chat-log normalizer.
//!
//! Converts the raw lines of an exported chat log into [`ChatMessage`]
//! records. Two line shapes are recognized:
//!
//! ```text
//! --- 2024년 1월 2일 화요일 ---
//! [민수] [오후 3:05] 안녕
//! ```
//!
//! A date header moves the date cursor; a message line is emitted under
//! the current cursor with its 12-hour clock converted to 24-hour time.
//! Everything else is skipped. The normalizer is best-effort and never
//! fails: unrecognized lines, message lines before the first header, and
//! messages carrying system-event markers are all dropped silently.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::ChatMessage;

/// Substrings that mark a message as a system event rather than text.
pub const DEFAULT_DENY_LIST: &[&str] = &[
    "이모티콘",
    "사진",
    "동영상",
    "삭제된 메시지입니다",
    "송금",
    "파일:",
    "(안내)",
    "받았어요.",
    "시작합니다!",
    "보냈어요.",
];

static DATE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-+\s(\d{4})년 (\d{1,2})월 (\d{1,2})일 .+ -+$")
        .expect("date header pattern is valid")
});

static MESSAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(.+?)\] \[(오전|오후) (\d{1,2}):(\d{2})\] (.+)$")
        .expect("message line pattern is valid")
});

/// Half of the day in a 12-hour timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// 오전
    Am,
    /// 오후
    Pm,
}

impl Period {
    fn parse(marker: &str) -> Option<Self> {
        match marker {
            "오전" => Some(Period::Am),
            "오후" => Some(Period::Pm),
            _ => None,
        }
    }
}

/// Convert a 12-hour clock reading to 24-hour time.
///
/// PM adds 12 unless the hour is 12; AM maps hour 12 to 0. Returns `None`
/// when the result is not a valid time of day.
pub fn to_24h(period: Period, hour: u32, minute: u32) -> Option<NaiveTime> {
    let hour = match period {
        Period::Pm if hour != 12 => hour + 12,
        Period::Am if hour == 12 => 0,
        _ => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Line-oriented parser for exported chat logs.
#[derive(Debug, Clone)]
pub struct LogNormalizer {
    deny_list: Vec<String>,
}

impl Default for LogNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_LIST.iter().map(|s| s.to_string()).collect())
    }
}

impl LogNormalizer {
    pub fn new(deny_list: Vec<String>) -> Self {
        Self { deny_list }
    }

    /// Parse lines into messages, preserving input order.
    pub fn normalize<I, S>(&self, lines: I) -> Vec<ChatMessage>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current_date: Option<NaiveDate> = None;
        let mut messages = Vec::new();

        for raw in lines {
            let line = raw.as_ref().trim();

            if let Some(caps) = DATE_HEADER.captures(line) {
                if let Some(date) = parse_date(&caps[1], &caps[2], &caps[3]) {
                    current_date = Some(date);
                }
                continue;
            }

            let Some(date) = current_date else {
                continue;
            };

            let Some(caps) = MESSAGE_LINE.captures(line) else {
                continue;
            };

            let text = &caps[5];
            if self.is_system_event(text) {
                continue;
            }

            let Some(time) = parse_clock(&caps[2], &caps[3], &caps[4]) else {
                continue;
            };

            messages.push(ChatMessage {
                date,
                time,
                speaker: caps[1].to_string(),
                text: text.to_string(),
            });
        }

        messages
    }

    /// True if `text` contains any deny-listed substring.
    pub fn is_system_event(&self, text: &str) -> bool {
        self.deny_list.iter().any(|k| text.contains(k.as_str()))
    }
}

fn parse_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_clock(marker: &str, hour: &str, minute: &str) -> Option<NaiveTime> {
    to_24h(Period::parse(marker)?, hour.parse().ok()?, minute.parse().ok()?)
}

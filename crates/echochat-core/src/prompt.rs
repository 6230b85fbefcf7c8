//! Prompt composition.
//!
//! Folds the style profile, retrieved messages, recent turns, and the new
//! user input into the system/user prompt pair sent to a
//! [`CompletionProvider`](crate::completion::CompletionProvider).

use serde::Serialize;

use crate::history::format_recent;
use crate::models::ConversationTurn;
use crate::style::SpeakerStyleProfile;

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "너는 대화 스타일을 유지하면서 자연스럽게 응답하는 AI야.";

/// Everything the prompt is built from for one turn.
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub speaker: &'a str,
    pub profile: &'a SpeakerStyleProfile,
    pub retrieved: &'a [String],
    pub history: &'a [ConversationTurn],
    pub user_input: &'a str,
}

/// A ready-to-send prompt pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

pub fn compose_prompt(input: &PromptInput<'_>, system_prompt: &str) -> ComposedPrompt {
    let speaker = input.speaker;
    let profile = input.profile;

    let user = format!(
        r#"You must speak like "{speaker}".
"{speaker}"'s conversation style is as follows:
- Average sentence length: {avg} characters (please respond with similar length)
- Frequently used words: {words}
- Common expressions: {expressions}

Generate responses to engage in a natural conversation with the user:
- Do not repeat the same sentence; adapt responses according to the context.
- Aim for a flow in conversation rather than simple question-answer exchanges.
- Provide direct answers to the user's questions while considering the continuity from previous dialogue.
- Create new responses but maintain "{speaker}"'s tone and style.

Past conversation history (for reference):
{history}

Recent conversation:
{recent}

User input:
{user_input}
"#,
        avg = profile.avg_length,
        words = profile.top_words.join(", "),
        expressions = profile.top_expressions.join(", "),
        history = input.retrieved.join("\n"),
        recent = format_recent(input.history),
        user_input = input.user_input,
    );

    ComposedPrompt {
        system: system_prompt.to_string(),
        user,
    }
}

//! Bounded conversation window.
//!
//! The window is plain data owned by the caller: [`push_turn`] consumes
//! the current window and returns the next one.

use crate::models::ConversationTurn;

/// Default number of turns kept in the window.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Append `turn` and drop the oldest turns until at most `limit` remain.
pub fn push_turn(
    mut window: Vec<ConversationTurn>,
    turn: ConversationTurn,
    limit: usize,
) -> Vec<ConversationTurn> {
    window.push(turn);
    if window.len() > limit {
        let excess = window.len() - limit;
        window.drain(..excess);
    }
    window
}

/// Render the window as `role: content` lines.
pub fn format_recent(window: &[ConversationTurn]) -> String {
    window
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

//! In-memory conversation state for one agent run.
//!
//! A [`Conversation`] starts with exactly one system turn followed by the
//! agent's retained history. Turns are only ever appended; nothing is
//! reordered or rewritten, and the system turn is never touched after
//! construction. State lives for the process lifetime of the owning agent.

use crate::types::{ConversationTurn, Role};

/// Append-only, system-first turn sequence sent to the model on every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    initial_len: usize,
}

impl Conversation {
    /// Start a conversation from a system prompt and prior (non-system) turns.
    pub fn new(system_prompt: &str, history: &[ConversationTurn]) -> Self {
        let mut turns = Vec::with_capacity(history.len() + 1);
        turns.push(ConversationTurn::system(system_prompt));
        turns.extend(
            history
                .iter()
                .filter(|turn| turn.role != Role::System)
                .cloned(),
        );
        let initial_len = turns.len();

        Self { turns, initial_len }
    }

    /// Append an assistant-authored turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::assistant(content));
    }

    /// Full turn sequence, system turn first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns appended since construction.
    pub fn appended(&self) -> usize {
        self.turns.len() - self.initial_len
    }

    /// Last turn appended during this run, if any.
    pub fn last_appended(&self) -> Option<&ConversationTurn> {
        if self.appended() == 0 {
            return None;
        }
        self.turns.last()
    }
}

//! Conversation data model.
//!
//! A conversation is an append-only sequence of [`ChatTurn`]s. Turns are
//! immutable once created; the sequence is never reordered or edited.

use serde::{Deserialize, Serialize};

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Message text. Never empty after trimming.
    text: String,
    /// Whether the user authored this turn (otherwise the assistant did).
    is_user: bool,
}

impl ChatTurn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }

    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the user authored this turn.
    pub fn is_user(&self) -> bool {
        self.is_user
    }

    /// Whether the assistant authored this turn.
    pub fn is_assistant(&self) -> bool {
        !self.is_user
    }
}

/// Ordered, append-only sequence of turns for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Returns its index.
    pub(crate) fn push(&mut self, turn: ChatTurn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// All turns in chronological order.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Check if there are no turns yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterate over the turns.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatTurn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ChatTurn;
    type IntoIter = std::slice::Iter<'a, ChatTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

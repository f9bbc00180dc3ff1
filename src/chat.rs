//! In-memory chat log for one session.

use std::fmt;

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Append-only, ordered log of chat turns.
///
/// Turns are never edited or removed and the log is not bounded.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    /// Creates an empty chat log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the end of the log.
    pub fn append(&mut self, role: ChatRole, content: impl Into<String>) {
        self.turns.push(ChatTurn::new(role, content));
    }

    /// Returns every turn in insertion order.
    pub fn all(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent turn.
    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }
}

//! The conversation store for a single session: an ordered,
//! append-only log of turns.
use serde::{Deserialize, Serialize};

use crate::openai::{Message, Role};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the conversation, as stored and rendered.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: &str) -> Self {
        Self {
            role: TurnRole::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.to_string(),
        }
    }

    pub fn to_message(&self) -> Message {
        let role = match self.role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        };
        Message::new(role, &self.content)
    }
}

// Alternation of user and assistant turns is expected but never
// checked here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation(Vec<Turn>);

impl Conversation {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A conversation holding only `seed`.
    pub fn seeded(seed: Turn) -> Self {
        Self(vec![seed])
    }

    pub fn append(&mut self, turn: Turn) {
        self.0.push(turn)
    }

    /// The full history in arrival order. Borrowed so it can't be
    /// modified behind the store's back.
    pub fn snapshot(&self) -> &[Turn] {
        &self.0
    }

    /// Drop every turn and start over from `seed`.
    pub fn reset(&mut self, seed: Turn) {
        self.0.clear();
        self.0.push(seed);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }
}

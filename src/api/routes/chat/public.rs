//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::{Session, Turn, TurnPhase};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Everything the chat widget needs to render a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub busy: bool,
    pub last_turn_failed: bool,
}

impl SessionView {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            turns: session.snapshot().to_vec(),
            busy: session.is_busy(),
            last_turn_failed: session.phase() == TurnPhase::RenderedError,
        }
    }
}

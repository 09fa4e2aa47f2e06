//! One connected client's chat: its conversation store plus the
//! per-turn state machine.
//!
//! A turn goes `Idle -> Sending -> Rendered | RenderedError`, after
//! which the session accepts input again. While a turn is `Sending`
//! the session rejects new input and clear requests. The model call
//! itself happens outside of the session so callers that share a
//! session behind a lock never hold it across the request:
//!
//! ```text
//! let pending = session.begin_turn(input)?;        // lock held
//! let reply = assembler.reply(llm, &pending.history, &pending.input).await;
//! session.finish_turn(pending, reply);             // lock held
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::assembler::PromptAssembler;
use super::conversation::{Conversation, Turn};
use super::persona::PersonaSpec;
use crate::openai::{ChatModel, ModelError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// Awaiting input. The state of a fresh or just cleared session.
    Idle,
    Sending,
    Rendered,
    RenderedError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Still waiting on the previous reply")]
    Busy,
    #[error("Message must not be empty")]
    EmptyInput,
}

/// A turn that has been accepted but not yet answered.
#[derive(Debug)]
pub struct PendingTurn {
    pub input: String,
    /// The conversation as it was before `input` was submitted
    pub history: Vec<Turn>,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    persona: Arc<PersonaSpec>,
    conversation: Conversation,
    phase: TurnPhase,
    last_active: Instant,
}

impl Session {
    /// Start a session seeded with the persona's greeting.
    pub fn new(id: &str, persona: Arc<PersonaSpec>) -> Self {
        let conversation = Conversation::seeded(Turn::assistant(&persona.greeting));
        Self {
            id: id.to_string(),
            persona,
            conversation,
            phase: TurnPhase::Idle,
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == TurnPhase::Sending
    }

    pub fn snapshot(&self) -> &[Turn] {
        self.conversation.snapshot()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Mark the session as used by its client just now.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// How long the client has been quiet as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    pub fn begin_turn(&mut self, input: &str) -> Result<PendingTurn, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.phase = TurnPhase::Sending;
        self.touch();
        Ok(PendingTurn {
            input: input.to_string(),
            history: self.conversation.snapshot().to_vec(),
        })
    }

    /// Store the user's input and the outcome of the model call. A
    /// failure is stored as an ordinary assistant turn carrying the
    /// error text, so it is also sent back as history next turn.
    pub fn finish_turn(
        &mut self,
        pending: PendingTurn,
        reply: Result<String, ModelError>,
    ) -> TurnPhase {
        self.touch();
        self.conversation.append(Turn::user(&pending.input));

        self.phase = match reply {
            Ok(text) => {
                self.conversation.append(Turn::assistant(&text));
                TurnPhase::Rendered
            }
            Err(err) => {
                tracing::warn!("Session {} turn failed: {}", self.id, err);
                let text = self.persona.error_reply(&err.to_string());
                self.conversation.append(Turn::assistant(&text));
                TurnPhase::RenderedError
            }
        };

        self.phase
    }

    /// Run a whole turn. Only for callers with exclusive access to the
    /// session for the duration of the model call.
    pub async fn submit(
        &mut self,
        assembler: &PromptAssembler,
        llm: &dyn ChatModel,
        input: &str,
    ) -> Result<TurnPhase, SessionError> {
        let pending = self.begin_turn(input)?;
        let reply = assembler
            .reply(llm, &pending.history, &pending.input)
            .await;
        Ok(self.finish_turn(pending, reply))
    }

    /// Throw away the history, leaving only the "cleared" greeting.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.conversation
            .reset(Turn::assistant(&self.persona.cleared_greeting));
        self.phase = TurnPhase::Idle;
        self.touch();
        tracing::debug!("Session {} cleared", self.id);
        Ok(())
    }
}

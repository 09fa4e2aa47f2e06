//! Builds chat completion requests out of the persona, the stored
//! history and the new user input, and asks the model for a reply.

use std::sync::Arc;

use crate::chat::conversation::Turn;
use crate::chat::persona::PersonaSpec;
use crate::core::AppConfig;
use crate::openai::{ChatModel, CompletionRequest, Message, ModelError, Role};

#[derive(Clone, Debug)]
pub struct PromptAssembler {
    persona: Arc<PersonaSpec>,
    model: String,
    temperature: f32,
    // `None` sends the whole history every turn
    max_history_turns: Option<usize>,
}

impl PromptAssembler {
    pub fn new(persona: Arc<PersonaSpec>, model: &str, temperature: f32) -> Self {
        Self {
            persona,
            model: model.to_string(),
            temperature,
            max_history_turns: None,
        }
    }

    pub fn from_config(persona: Arc<PersonaSpec>, config: &AppConfig) -> Self {
        Self::new(persona, &config.model, config.temperature)
            .with_history_window(config.max_history_turns)
    }

    /// Only send the newest `max_turns` prior turns to the model. The
    /// conversation store itself is never trimmed.
    pub fn with_history_window(mut self, max_turns: Option<usize>) -> Self {
        self.max_history_turns = max_turns;
        self
    }

    pub fn persona(&self) -> Arc<PersonaSpec> {
        Arc::clone(&self.persona)
    }

    /// `history` must not contain `input`: it is the conversation as
    /// it was before the user submitted. The persona instruction always
    /// goes first and the new input always goes last.
    pub fn build_request(&self, history: &[Turn], input: &str) -> CompletionRequest {
        let window = match self.max_history_turns {
            Some(max) => &history[history.len().saturating_sub(max)..],
            None => history,
        };

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(Message::new(Role::System, &self.persona.instruction));
        messages.extend(window.iter().map(Turn::to_message));
        messages.push(Message::new(Role::User, input));

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }

    /// Runs one model call. Failures come back as values so the caller
    /// can store them in the conversation like any other reply.
    pub async fn reply(
        &self,
        llm: &dyn ChatModel,
        history: &[Turn],
        input: &str,
    ) -> Result<String, ModelError> {
        let request = self.build_request(history, input);
        tracing::debug!(
            "Requesting completion from {} with {} messages",
            request.model,
            request.messages.len()
        );

        llm.complete(&request)
            .await
            .inspect_err(|e| tracing::error!("Completion failed: {}", e))
    }
}

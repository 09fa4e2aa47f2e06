//! An in-memory `ChatModel` for tests that don't want a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::core::{ChatModel, CompletionRequest, ModelError};

/// Returns queued replies in order and records every request. When
/// the queue is empty it answers with `fallback_reply`.
pub struct MockChatModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback_reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new("呵。")
    }
}

impl MockChatModel {
    pub fn new(fallback_reply: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback_reply: fallback_reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: &str) {
        self.responses
            .lock()
            .expect("Mock lock poisoned")
            .push_back(Ok(reply.to_string()));
    }

    pub fn queue_error(&self, error: ModelError) {
        self.responses
            .lock()
            .expect("Mock lock poisoned")
            .push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("Mock lock poisoned").clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.requests
            .lock()
            .expect("Mock lock poisoned")
            .push(request.clone());
        self.responses
            .lock()
            .expect("Mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback_reply.clone()))
    }
}

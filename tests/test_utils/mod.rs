//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use bittersoup::api::AppState;
use bittersoup::api::app;
use bittersoup::chat::{PersonaSpec, PromptAssembler};
use bittersoup::core::AppConfig;
use bittersoup::openai::ChatModel;

pub fn test_config() -> AppConfig {
    let web_root = format!("{}/web-ui/src", env!("CARGO_MANIFEST_DIR"));
    AppConfig::from_lookup(|name| match name {
        "OPENROUTER_API_KEY" => Some(String::from("test-api-key")),
        "BITTERSOUP_MODEL" => Some(String::from("test-model")),
        "BITTERSOUP_WEB_ROOT" => Some(web_root.clone()),
        _ => None,
    })
    .expect("Test config should be valid")
}

/// Creates a test application router backed by `llm` (usually a
/// `MockChatModel`) instead of a real endpoint. Also returns the shared state so tests can poke at
/// sessions directly.
#[allow(dead_code)]
pub fn test_app_with_state<M: ChatModel + 'static>(
    llm: Arc<M>,
) -> (Router, Arc<RwLock<AppState>>) {
    let config = test_config();
    let persona = Arc::new(PersonaSpec::load(None).expect("Persona should render"));
    let assembler = PromptAssembler::from_config(persona, &config);
    let state = Arc::new(RwLock::new(AppState::new(config, assembler, llm)));
    (app(Arc::clone(&state)), state)
}

#[allow(dead_code)]
pub fn test_app<M: ChatModel + 'static>(llm: Arc<M>) -> Router {
    test_app_with_state(llm).0
}

#[allow(dead_code)]
pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

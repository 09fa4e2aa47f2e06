use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use anyhow::Result;

use crate::chat::{PersonaSpec, PromptAssembler, Session};
use crate::core::AppConfig;
use crate::openai::{ChatModel, OpenAiClient};

pub type SharedSession = Arc<RwLock<Session>>;

pub struct AppState {
    pub config: AppConfig,
    pub assembler: Arc<PromptAssembler>,
    pub llm: Arc<dyn ChatModel>,
    // One conversation per browser session, keyed by the id the client
    // generates. Never shared between ids.
    sessions: HashMap<String, SharedSession>,
}

impl AppState {
    pub fn new(config: AppConfig, assembler: PromptAssembler, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            assembler: Arc::new(assembler),
            llm,
            sessions: HashMap::new(),
        }
    }

    /// Build the persona and the HTTP client. Failing here is fatal.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let persona = Arc::new(PersonaSpec::load(config.system_message.as_deref())?);
        let assembler = PromptAssembler::from_config(persona, &config);
        let llm = OpenAiClient::new(
            &config.api_base_url,
            &config.api_key,
            config.request_timeout,
        )?;
        Ok(Self::new(config, assembler, Arc::new(llm)))
    }

    pub fn session(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).cloned()
    }

    /// Fetch the session for `id`, starting a freshly seeded one if
    /// this is the first time the id is seen.
    pub fn session_or_create(&mut self, id: &str) -> SharedSession {
        let persona = self.assembler.persona();
        let session = self.sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::info!("Starting session {}", id);
            Arc::new(RwLock::new(Session::new(id, persona)))
        });
        Arc::clone(session)
    }

    /// Drop the session and its history. Returns `false` if there was
    /// no such session.
    pub fn end_session(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Ended session {}", id);
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions whose client has been quiet for longer than the
    /// configured TTL. Sessions waiting on a reply, or locked by a
    /// request right now, are kept. Returns how many were dropped.
    pub fn sweep_idle(&mut self, now: Instant) -> usize {
        let ttl = self.config.session_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let Ok(session) = session.try_read() else {
                return true;
            };
            let keep = session.is_busy() || session.idle_for(now) < ttl;
            if !keep {
                tracing::info!("Dropping idle session {}", id);
            }
            keep
        });
        before - self.sessions.len()
    }
}

//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Start or resume a session and return everything to render
async fn chat_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<public::SessionView> {
    let session = state
        .write()
        .expect("Unable to write shared state")
        .session_or_create(&id);
    let mut session = session.write().expect("Unable to write session");
    session.touch();

    Json(public::SessionView::from_session(&session))
}

/// Submit the next user message and wait for the reply
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<public::ChatRequest>,
) -> Result<Json<public::SessionView>, ApiError> {
    let (session, assembler, llm) = {
        let mut shared_state = state.write().expect("Unable to write shared state");
        (
            shared_state.session_or_create(&payload.session_id),
            Arc::clone(&shared_state.assembler),
            Arc::clone(&shared_state.llm),
        )
    };

    let pending = session
        .write()
        .expect("Unable to write session")
        .begin_turn(&payload.message)?;

    // Run the turn in its own task so the session still gets its reply
    // stored if the client goes away mid-request
    let handle = tokio::spawn(async move {
        let reply = assembler
            .reply(llm.as_ref(), &pending.history, &pending.input)
            .await;
        let mut session = session.write().expect("Unable to write session");
        session.finish_turn(pending, reply);
        public::SessionView::from_session(&session)
    });

    Ok(Json(handle.await?))
}

/// Reset the history to the "cleared" greeting
async fn clear_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::SessionView>, ApiError> {
    let session = state
        .read()
        .expect("Unable to read shared state")
        .session(&id)
        .ok_or_else(|| ApiError::not_found(&format!("Chat session {} not found", id)))?;

    let mut session = session.write().expect("Unable to write session");
    session.clear()?;

    Ok(Json(public::SessionView::from_session(&session)))
}

/// End the session and discard its history
async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .write()
        .expect("Unable to write shared state")
        .end_session(&id);

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(&format!("Chat session {} not found", id)))
    }
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/{id}", get(chat_session).delete(end_session))
        .route("/{id}/clear", post(clear_session))
}

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::core::logging::{init_tracing, server_filter};

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    let cors = CorsLayer::permissive();
    let web_root = shared_state
        .read()
        .expect("Unable to read shared state")
        .config
        .web_root
        .clone();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        // Static server of the chat widget
        .fallback_service(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(ServeDir::new(web_root)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drop sessions whose page went away without saying so
fn spawn_session_sweeper(shared_state: Arc<RwLock<AppState>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = shared_state
                .write()
                .expect("Unable to write shared state")
                .sweep_idle(Instant::now());
            if removed > 0 {
                tracing::debug!("Swept {} idle sessions", removed);
            }
        }
    });
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    init_tracing(&server_filter());

    let app_state = AppState::from_config(config)?;
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    // Runs in its own task for the life of the server
    spawn_session_sweeper(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Moderation HTTP API for QaBase.
//!
//! JSON over axum. Every intake channel, the moderation queue, the admin
//! edit and delete operations, and the public search endpoints are routed
//! here onto the [`LifecycleEngine`](qabase_core::LifecycleEngine) and
//! [`SearchIndex`](qabase_core::SearchIndex).

pub mod error;
mod handlers;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use qabase_shared::{AppConfig, QaBaseError, Result};
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use state::AppState;

/// Build the router with every route mounted.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        // intake
        .route("/qa", post(handlers::submit).get(handlers::list))
        .route("/import", post(handlers::import_csv))
        .route("/voice", post(handlers::submit_voice))
        .route("/chat/question", post(handlers::chat_question))
        // moderation
        .route("/pending", get(handlers::pending))
        .route("/approve/{id}", post(handlers::approve))
        .route("/reject/{id}", post(handlers::reject))
        .route("/unanswered", get(handlers::unanswered))
        .route("/unanswered/{id}/answer", post(handlers::add_answer))
        .route(
            "/qa/{id}",
            get(handlers::get_entry)
                .put(handlers::edit_entry)
                .delete(handlers::delete_entry),
        )
        .route("/log/questions", get(handlers::question_log))
        // search
        .route("/search", post(handlers::search))
        .route("/chat/search", get(handlers::chat_search))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Open storage from `config`, bind and serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = AppState::from_config(config).await?;
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| QaBaseError::Server(format!("cannot bind {}: {e}", config.server.bind)))?;

    let addr = listener
        .local_addr()
        .map_err(|e| QaBaseError::Server(format!("cannot read bound address: {e}")))?;
    info!(%addr, voice = state.voice.is_some(), "moderation API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| QaBaseError::Server(e.to_string()))?;

    info!("moderation API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

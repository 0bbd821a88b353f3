use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ChatEnvelope, InboundChatMessage, EMBEDDED_RECORD_CONTRACT},
};
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod agent;
mod config;

use agent::ScriptedAgent;
use config::load_settings;

struct AppState {
    agent: Mutex<ScriptedAgent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let state = AppState {
        agent: Mutex::new(ScriptedAgent::new(
            settings.agent_name,
            settings.company_name,
        )),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, contract = EMBEDDED_RECORD_CONTRACT, "stub chat backend listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InboundChatMessage>,
) -> Result<Json<ChatEnvelope>, (StatusCode, Json<ApiError>)> {
    let message = req.content.trim();
    if message.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(ErrorCode::Validation, "message cannot be empty")),
        ));
    }

    let payload = state.agent.lock().await.reply(message);
    let response = serde_json::to_string(&payload).map_err(|e| {
        error!(error = %e, "failed to encode reasoning payload");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    info!(
        stage = payload.current_conversation_stage.as_deref().unwrap_or_default(),
        "answered chat turn"
    );
    Ok(Json(ChatEnvelope { response }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

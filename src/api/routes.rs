//! Router assembly, shared state and server lifecycle.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::{GroqClient, LlmClient};
use crate::settings::{
    FileStorage, MemoryStorage, SettingsStore, SharedSettingsStore, StorageBackend,
};
use crate::tools::{Catalog, ToolBindings, ToolRegistry};
use crate::transcribe::{GroqTranscriber, Transcriber};

use super::chat;
use super::settings as settings_api;
use super::transcribe;

/// Upload limit for audio files (matches the provider's 25 MB cap).
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Streaming chat provider
    pub llm: Arc<dyn LlmClient>,
    /// Speech-to-text provider; `None` when no API key is configured
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// Every tool the server can offer
    pub tools: Arc<ToolRegistry>,
    /// Catalog id → registry key table
    pub bindings: Arc<ToolBindings>,
    /// Enabled-map and credentials
    pub settings: SharedSettingsStore,
}

impl AppState {
    /// Build the production state: Groq clients, built-in tools and catalog.
    ///
    /// Fails if the catalog and the tool registry disagree.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(Catalog::builtin().context("Built-in tool catalog is invalid")?);
        let tools = ToolRegistry::with_defaults();
        let bindings = ToolBindings::builtin();
        bindings
            .validate(&catalog, &tools)
            .context("Tool bindings do not match the tool catalog")?;

        let backend: Arc<dyn StorageBackend> = match &config.data_dir {
            Some(dir) => {
                tracing::info!("Persisting tool settings under {}", dir.display());
                Arc::new(FileStorage::new(dir))
            }
            None => {
                tracing::info!("No data directory configured, tool settings are kept in memory");
                Arc::new(MemoryStorage::new())
            }
        };
        let settings = Arc::new(SettingsStore::open(backend, catalog).await);

        let api_key = config.groq_api_key.clone();
        if api_key.is_none() {
            tracing::warn!(
                "GROQ_API_KEY is not set: transcription is disabled and chat requests will fail"
            );
        }
        let llm: Arc<dyn LlmClient> = Arc::new(GroqClient::new(api_key.clone().unwrap_or_default()));
        let transcriber = api_key
            .map(|key| Arc::new(GroqTranscriber::new(key)) as Arc<dyn Transcriber>);

        Ok(Self {
            config,
            llm,
            transcriber,
            tools: Arc::new(tools),
            bindings: Arc::new(bindings),
            settings,
        })
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let transcribe_route = Router::new()
        .route("/api/transcribe", post(transcribe::transcribe))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat::chat))
        .merge(transcribe_route)
        .nest("/api/settings", settings_api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::from_config(config).await?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    transcription_enabled: bool,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        transcription_enabled: state.transcriber.is_some(),
    })
}

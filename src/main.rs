//! Interview agent - an HTTP service that runs a mock interview against a
//! hosted LLM, keeping the transcript in memory.

mod agent;
mod api;
mod config;
mod conversation;
mod filter;
mod interview;
mod llm;
mod system_prompt;
mod tools;

use agent::ToolCallingAgent;
use api::{create_router, AppState};
use config::ServiceConfig;
use conversation::ConversationStore;
use interview::InterviewService;
use llm::{GeminiService, LlmService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tools::ToolRegistry;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; real environment variables still apply
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_agent=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Configuration
    let config = ServiceConfig::from_env();
    if config.google_api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set; model calls will fail until it is provided");
    }

    let gemini: Arc<dyn LlmService> = Arc::new(GeminiService::new(
        config.google_api_key.clone(),
        config.model.clone(),
        &config.gemini_base_url,
    )?);
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(gemini));

    let gateway = Arc::new(ToolCallingAgent::new(
        llm,
        ToolRegistry::new(),
        config.max_tool_rounds,
    ));
    let store = Arc::new(ConversationStore::new(
        config.system_prompt.clone(),
        config.max_history,
    ));
    let interview =
        InterviewService::new(store, gateway).with_start_on_empty(config.start_on_empty);

    tracing::info!(
        model = %config.model,
        max_history = ?config.max_history,
        static_dir = %config.static_dir.display(),
        "Interview service initialized"
    );

    // Create application state
    let state = AppState::new(interview, config.static_dir.clone());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Interview agent listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

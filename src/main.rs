//! Intake Agent server binary.

use std::sync::Arc;

use intake_agent::adapters::ai::{LlmFieldExtractor, OpenAIConfig, OpenAIProvider};
use intake_agent::adapters::storage::{FileRecordSink, InMemoryRecordSink};
use intake_agent::adapters::websocket::{websocket_router, WebSocketState};
use intake_agent::application::{IntakeConversationHandler, SessionRegistry};
use intake_agent::config::{AppConfig, ConfigError, RecordSinkKind, ValidationError};
use intake_agent::ports::{AIProvider, RecordSink};
use secrecy::ExposeSecret;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    init_tracing(&config);

    config.validate().map_err(ConfigError::from)?;
    let addr = config.server.socket_addr()?;

    // Extraction
    let api_key = config
        .ai
        .api_key()
        .ok_or(ValidationError::MissingRequired(intake_agent::config::OPENAI_API_KEY_ENV))?;
    let provider = OpenAIProvider::new(
        OpenAIConfig::new(api_key.expose_secret().clone())
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.request_timeout())
            .with_max_retries(config.ai.max_retries),
    )?;
    let provider: Arc<dyn AIProvider> = Arc::new(provider);
    let info = provider.provider_info();
    tracing::info!(provider = %info.name, model = %info.model, "Extraction provider ready");
    let extractor = LlmFieldExtractor::new(provider, config.intake.extraction_timeout());

    // Persistence
    let sink: Arc<dyn RecordSink> = match config.intake.record_sink {
        RecordSinkKind::File => {
            tracing::info!(dir = %config.intake.records_dir.display(), "Using file record sink");
            Arc::new(FileRecordSink::new(&config.intake.records_dir))
        }
        RecordSinkKind::Memory => {
            tracing::warn!("Using in-memory record sink; records are lost on exit");
            Arc::new(InMemoryRecordSink::new())
        }
    };

    let handler = IntakeConversationHandler::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(extractor),
        sink,
    );
    let state = WebSocketState::new(Arc::new(handler), config.server.max_message_bytes);

    let app = websocket_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Intake agent listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Intake agent stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

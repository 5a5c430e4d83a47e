//! Interview Coach - DSA practice API with a simulated interviewer
//!
//! Serves a small problem catalog, guesses the complexity of submitted code
//! from surface patterns, grades it with a mock test runner, and keeps an
//! LLM-backed interviewer talking about the result.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analyzer;
mod catalog;
mod config;
mod conversation;
mod cover_letter;
mod execution;
mod interviewer;
mod providers;
mod routes;
mod session;

use analyzer::CodeAnalyzer;
use catalog::ProblemCatalog;
use config::{Config, PromptSet};
use cover_letter::CoverLetterWriter;
use execution::{ExecutionPolicy, MockExecutionEngine};
use interviewer::Interviewer;
use providers::{ChatProvider, UnconfiguredProvider};
use session::{InterviewService, SessionPolicy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InterviewService>,
    pub cover_letters: Arc<CoverLetterWriter>,
    pub provider_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_coach=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let service_config = config.load_service_config()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let provider: Arc<dyn ChatProvider> = match providers::from_config(&config) {
        Ok(provider) => {
            tracing::info!(base_url = %provider.config().base_url, "LLM provider configured");
            Arc::new(provider)
        }
        Err(e) => {
            tracing::warn!("{}; the interviewer will answer with canned replies", e);
            Arc::new(UnconfiguredProvider::new(e.to_string()))
        }
    };
    let provider_name = provider.name().to_string();

    let catalog = Arc::new(ProblemCatalog::builtin());
    tracing::info!("📚 Loaded {} problem(s)", catalog.len());

    let engine = Arc::new(MockExecutionEngine::new(ExecutionPolicy::from(
        &service_config.execution,
    )));
    if let Some(seed) = engine.policy().seed {
        tracing::info!(seed, "mock runner seeded, grading is reproducible");
    }

    let interviewer = Arc::new(Interviewer::new(
        provider.clone(),
        PromptSet::with_overrides(&service_config.prompts),
        &service_config.llm,
    ));

    let service = Arc::new(InterviewService::new(
        catalog,
        Arc::new(CodeAnalyzer::default()),
        engine,
        interviewer,
        SessionPolicy::from(&service_config),
    ));

    if service.spawn_idle_sweeper().is_some() {
        tracing::info!("idle interviews are swept in the background");
    }

    let state = AppState {
        service,
        cover_letters: Arc::new(CoverLetterWriter::new(provider, &service_config.llm)),
        provider_name,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🎤 Interview Coach API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

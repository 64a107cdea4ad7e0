//! HTTP entrypoint for the interview service.
//!
//! Reads `Config` from the environment, wires the session store to the
//! configured model provider and domain directory, and serves the REST API
//! until Ctrl+C.

use anyhow::Context;
use interview_api::{
    config::Config,
    router::create_router,
    state::{AppState, SessionStore},
};
use interview_core::{
    domain::FileDomainCatalog,
    llm_client::{LLMClient, OpenAICompatibleClient, TimeoutClient},
    prompts::PromptTemplates,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received; draining connections."),
        Err(e) => error!(error = %e, "Could not listen for Ctrl+C"),
    }
}

/// The provider's client, bounded by the configured generation timeout.
fn build_llm_client(config: &Config) -> anyhow::Result<Arc<dyn LLMClient>> {
    let api_key = config
        .api_key()
        .context("No API key configured for the selected provider")?;
    let provider: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::for_provider(
        &config.provider,
        api_key,
        config.chat_model.clone(),
    ));
    Ok(Arc::new(TimeoutClient::new(
        provider,
        config.generation_timeout,
    )))
}

fn build_state(config: Config) -> anyhow::Result<AppState> {
    let prompts = PromptTemplates::load_dir(&config.prompts_path)
        .context("Failed to load prompt templates")?;
    Ok(AppState {
        sessions: Arc::new(SessionStore::new()),
        domains: Arc::new(FileDomainCatalog::new(config.domains_path.clone())),
        llm_client: build_llm_client(&config)?,
        prompts: Arc::new(prompts),
        config: Arc::new(config),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let bind_address = config.bind_address;
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        domains = %config.domains_path.display(),
        timeout_secs = config.generation_timeout.as_secs(),
        idle_timeout_secs = config.session_idle_timeout.as_secs(),
        "Configuration loaded"
    );
    let state = Arc::new(build_state(config)?);

    let idle_timeout = state.config.session_idle_timeout;
    let sweep_every = (idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
    let sweeper = state
        .sessions
        .clone()
        .spawn_idle_sweeper(idle_timeout, sweep_every);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(%bind_address, "Interview API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Interview API stopped.");
    Ok(())
}

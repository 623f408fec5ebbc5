//! gollama-server binary: load configuration, wire the model backend,
//! GitHub tools, and session store together, then serve until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use gollama_ai::{OpenAiClient, OpenAiConfig, Orchestrator, ToolRegistry};
use gollama_common::GollamaError;
use gollama_config::ServerConfig;
use gollama_github::{GitHubClient, GitHubConfig};
use gollama_server::{serve, AppState, RequestHandler, SessionStore};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "gollama-server", about = "Chat server for the Gollama GitHub assistant")]
struct Args {
    /// Port to listen on (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// OpenAI-compatible model backend URL (overrides BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Model name (overrides MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "gollama=info")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), GollamaError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    let mut config = gollama_config::load_config()?;
    args.apply(&mut config);
    gollama_config::validation::validate(&config)?;
    debug!(config = %gollama_config::config_to_json(&config), "Configuration loaded");

    let ai = Arc::new(
        OpenAiClient::new(
            OpenAiConfig::new(config.base_url.clone(), config.model.clone())
                .with_api_key(config.api_key.clone()),
        )
        .map_err(|e| GollamaError::Ai(e.to_string()))?,
    );
    match ai.list_models().await {
        Ok(models) => info!(base_url = %config.base_url, models = models.len(), "Connected to model backend"),
        Err(e) => warn!(
            base_url = %config.base_url,
            error = %e,
            "Could not reach the model backend. Is it running?"
        ),
    }

    let github = GitHubClient::new(
        GitHubConfig::new(config.github_token.clone()).with_api_url(config.github_api_url.clone()),
    )
    .map_err(|e| GollamaError::Network(e.to_string()))?;
    let registry = ToolRegistry::github(Arc::new(github))
        .map_err(|e| GollamaError::Other(e.to_string()))?;

    let orchestrator = Orchestrator::new(ai, Arc::new(registry))
        .with_max_rounds(config.max_tool_rounds as usize);

    let shutdown = CancellationToken::new();
    let sessions = SessionStore::new();
    let reaper = sessions.spawn_reaper(
        config.session_sweep_interval(),
        config.session_idle_ttl(),
        shutdown.clone(),
    );

    let handler = Arc::new(RequestHandler::new(sessions, Arc::new(orchestrator)));
    let state = Arc::new(
        AppState::new(handler).with_outbound_capacity(config.outbound_queue_capacity),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(model = %config.model, "gollama-server listening on {}", addr);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                signal.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    serve(listener, state, shutdown.clone()).await?;

    shutdown.cancel();
    let _ = reaper.await;
    info!("gollama-server stopped");
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;
use rolechat_core::{AppCore, registry::StaticPersonaRegistry};
use rolechat_server::{
    api::state::AppState, app, config::ServerConfig, logging, middleware::JwtVerifier,
};
use rolechat_storage::paths;
use rolechat_traits::PersonaRegistry;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    logging::init_tracing(config.log_json);

    tracing::info!("Starting RoleChat server");

    let db_path = match &config.db_path {
        Some(path) => path.clone(),
        None => paths::default_database_path()?,
    };

    let personas: Arc<dyn PersonaRegistry> = match &config.personas_file {
        Some(file) => Arc::new(StaticPersonaRegistry::from_toml_file(file)?),
        None => Arc::new(StaticPersonaRegistry::builtin()?),
    };
    tracing::info!(personas = ?personas.keys(), "Loaded personas");

    let llm = rolechat_ai::create_client(&config.llm);
    let core = AppCore::new(&db_path, personas, llm, config.stream.clone())
        .with_context(|| format!("Failed to open database {}", db_path.display()))?
        .with_sampling(config.llm.temperature, config.llm.max_tokens);

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Arc::new(core),
        JwtVerifier::new(&config.jwt_secret),
        shutdown.clone(),
    );
    let router = app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("RoleChat running on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("RoleChat stopped");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM, then cancel live reply streams.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, closing live streams");
    shutdown.cancel();
}

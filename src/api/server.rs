//! HTTP server lifecycle: bind → serve `api_router()` → shut down gracefully.
//!
//! A background task prunes abandoned chat sessions while the server runs.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::completion::{CompletionError, CompletionService};
use crate::config::{AppConfig, ConfigError};
use crate::referral::{EmailSender, HttpEmailSender, ReferralError};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Completion setup failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Email setup failed: {0}")]
    Email(#[from] ReferralError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiContext {
    /// Build the full context, including live HTTP clients, from config.
    ///
    /// Call this outside the async runtime: blocking reqwest clients must
    /// not be created or dropped on a runtime thread.
    pub fn from_config(config: AppConfig) -> Result<Self, ServerError> {
        let completion = CompletionService::from_config(&config.completion)?;
        let email = HttpEmailSender::from_config(&config.email)?
            .map(|sender| Arc::new(sender) as Arc<dyn EmailSender>);
        Ok(Self::new(config, completion, email))
    }
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(ctx: ApiContext, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind = ctx.config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(bind.as_str())
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind.clone(),
            source,
        })?;
    let addr = listener.local_addr()?;

    let pruner = tokio::spawn(prune_sessions(ctx.clone()));
    let app = api_router(ctx);

    tracing::info!(%addr, "COLONAiVE API listening");

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    pruner.abort();
    tracing::info!("COLONAiVE API stopped");
    result.map_err(ServerError::from)
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn prune_sessions(ctx: ApiContext) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        ticker.tick().await;
        match ctx.sessions.lock() {
            Ok(mut sessions) => {
                sessions.prune(Instant::now());
            }
            Err(_) => {
                tracing::error!("Session registry lock poisoned, stopping pruner");
                return;
            }
        }
    }
}

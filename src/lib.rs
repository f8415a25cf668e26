pub mod api; // HTTP surface
pub mod chatbot; // Dialog engine
pub mod completion; // Language-model relay
pub mod config;
pub mod forms;
pub mod referral; // Champion invitations

use tracing_subscriber::EnvFilter;

use api::{ApiContext, ServerError};

/// Start the service and block until shutdown.
pub fn run() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::load()?;
    // Built before the runtime: it owns blocking HTTP clients
    let ctx = ApiContext::from_config(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(api::serve(ctx.clone(), api::shutdown_signal()));
    drop(runtime);

    if let Err(e) = &result {
        tracing::error!("Server exited with error: {e}");
    }
    result
}

pub mod allocation; // Senior allocation programs + claims
pub mod announcements;
pub mod api; // HTTP JSON portal
pub mod config;
pub mod dashboard;
pub mod db;
pub mod dispensing; // FEFO, duty-gated dispense transaction
pub mod duty;
pub mod error;
pub mod inventory;
pub mod models;
pub mod requests;
pub mod residents;

use tracing_subscriber::EnvFilter;

/// Initialize tracing. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Start the portal and serve until Ctrl-C.
pub async fn run(config: config::ServerConfig) -> Result<(), String> {
    tracing::info!(
        version = config::APP_VERSION,
        db = %config.db_path.display(),
        "{} starting",
        config::APP_NAME
    );

    let mut server = api::start_server(&config).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}

use anyhow::Context;
use dotenv::dotenv;
use sample_vault_api::{create_router, AppState};
use sample_vault_core::Vault;
use std::env;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logger() -> tracing_appender::non_blocking::WorkerGuard {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/sample-vault-api.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(EnvFilter::new(filter))
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guard = init_logger();

    let config = sample_vault_core::config::load_configuration()
        .context("loading configuration")?;
    let vault = Vault::open(&config).context("opening vault")?;

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, create_router(AppState::new(vault)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

use std::sync::Arc;

use clap::Parser;
use snafu::{ResultExt, Whatever};
use tracing_subscriber::EnvFilter;

use result_registry_sdk::{CallBuilder, LedgerClient, Signer};
use result_registry_server::{http, Cli, InMemoryMirror, ResultService};

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.client_config().whatever_context("invalid configuration")?;

    let signer =
        Arc::new(Signer::from_encoded_key(&cli.signer_key).whatever_context("invalid signer key")?);
    tracing::info!(sender = signer.address(), "signer loaded");

    let builder = CallBuilder::from_config(&config);
    let ledger = Arc::new(
        LedgerClient::new(config, signer).whatever_context("failed to build ledger client")?,
    );
    let mirror = Arc::new(InMemoryMirror::new());
    let service = Arc::new(ResultService::new(ledger, builder, mirror));

    let listener = tokio::net::TcpListener::bind(cli.listen_addr)
        .await
        .whatever_context("failed to bind listener")?;
    tracing::info!(addr = %cli.listen_addr, "registry service listening");

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .whatever_context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
}

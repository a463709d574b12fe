//! `lightning-billpay` server binary.
//!
//! Configuration comes from the environment (and `.env` if present):
//!
//! ```bash
//! export LND_REST_URL=https://localhost:8080
//! export LND_MACAROON_PATH=~/.lnd/data/chain/bitcoin/mainnet/invoice.macaroon
//! export LND_CERT=~/.lnd/tls.cert
//! export STORE_PATH=./data/invoices
//! export LOG_FORMAT=json   # optional; text by default, json in production
//!
//! lightning-billpay
//! ```

use billpay_api::{
    routes,
    state::{AppConfig, AppState},
};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.json_logs());

    let state = AppState::new(config)?;
    let addr = state.config.socket_addr()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %state.config.environment,
        node = state.node.node_name(),
        store = state.store.store_name(),
        carriers = state.catalog.carriers.len(),
        utilities = state.catalog.utilities.len(),
        schools = state.catalog.schools.len(),
        "billpay service configured"
    );

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Resolves on Ctrl+C or SIGTERM. In-flight requests finish before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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
    info!("shutdown signal received");
}

//! usersvc-server binary.
//!
//! Loads the YAML config (or defaults), applies `USERS_*` environment
//! overrides, and serves the users API until Ctrl-C or SIGTERM.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usersvc_server::{config, AppState};

#[derive(Debug, Parser)]
#[command(name = "usersvc-server", version, about = "Users service HTTP API")]
struct Cli {
    /// YAML config file. Defaults apply when omitted.
    #[arg(short, long, env = "USERS_CONFIG")]
    config: Option<String>,

    /// Listen address, overriding `service.listen`.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        cfg.service.listen = listen;
    }
    let addr = cfg.service.listen_addr()?;

    let state = AppState::new(cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        instance = %state.cfg().service.instance_id,
        environment = ?state.cfg().service.environment,
        "usersvc-server listening"
    );

    let draining = state.clone();
    usersvc_server::serve(listener, state, async move {
        shutdown_signal().await;
        draining.mark_draining();
    })
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}

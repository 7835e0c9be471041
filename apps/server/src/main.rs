use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warbler_backend_api::build_router;
use warbler_backend_runtime::{shutdown_signal, telemetry, BackendServices, BackgroundTasks};
use warbler_config::load as load_config;
use warbler_database::initialize_database;

#[derive(Parser)]
#[command(name = "warbler-backend")]
#[command(about = "Warbler microblogging backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server and the notification consumer
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Migrate => migrate().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Warbler backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let cancel = CancellationToken::new();
    let tasks = BackgroundTasks::spawn(&services, cancel.clone());
    let app = build_router(services.app_state());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    let signal = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                signal.cancel();
            })
            .await
    });

    let grace = Duration::from_secs(config.http.shutdown_grace_seconds);
    let outcome = tokio::select! {
        joined = &mut server => joined,
        _ = cancel.cancelled() => match tokio::time::timeout(grace, &mut server).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(grace_seconds = grace.as_secs(), "in-flight requests did not finish, forcing close");
                server.abort();
                Ok(Ok(()))
            }
        },
    };

    tasks.shutdown().await;

    outcome
        .context("http server task panicked")?
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    let pool = initialize_database(&config.database)
        .await
        .context("failed to migrate database")?;
    pool.close().await;

    info!(url = %config.database.url, "database is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["warbler-backend"]).unwrap();
        assert_eq!(None, cli.command);
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["warbler-backend", "migrate"]).unwrap();
        assert_eq!(Some(Commands::Migrate), cli.command);

        let cli = Cli::try_parse_from(["warbler-backend", "serve"]).unwrap();
        assert_eq!(Some(Commands::Serve), cli.command);
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["warbler-backend", "console"]).is_err());
    }
}

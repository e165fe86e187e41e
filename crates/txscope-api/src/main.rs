//! txscope CLI and REST API entry point.
//!
//! Binary name: `txscope`
//!
//! Parses CLI arguments, initializes tracing and the persistence plugin, then
//! dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use txscope_observe::tracing_setup::{init_tracing, shutdown_tracing, LogFormat};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,txscope=debug",
        _ => "trace",
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(filter, format, cli.otel).map_err(|e| anyhow::anyhow!(e))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Units { units } => {
            let path = txscope_infra::config::resolve_config_path(
                units.as_deref(),
                txscope_infra::config::PERSISTENCE_FILE,
            );
            cli::units::list_units(&path, cli.json).await?;
        }

        Commands::Check { config } => {
            let state = AppState::init(&config.config_path(), &config.units_path(), &config.plugin).await?;
            cli::check::check(&state, cli.json).await?;
        }

        Commands::Serve { port, host, config } => {
            let state = AppState::init(&config.config_path(), &config.units_path(), &config.plugin).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} txscope listening on {} (plugin '{}')",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan(),
                    state.uow.name(),
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            state.uow.shutdown().await;
            tracing::info!(
                uptime_secs = state.started_at.elapsed().as_secs(),
                "server stopped"
            );
            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
}

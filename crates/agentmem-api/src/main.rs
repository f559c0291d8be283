//! agentmem CLI and runtime server entry point.
//!
//! Binary name: `agentmem`
//!
//! Parses CLI arguments, sets up tracing, then either serves the AgentCore
//! runtime contract or runs the short-term memory smoke test.

mod cli;
mod http;
mod state;

use std::process::ExitCode;

use clap::Parser;

use agentmem_observe::tracing_setup::{
    TracingOptions, directive_for_verbosity, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        otel: cli.otel,
        json: cli.json,
        default_directive: directive_for_verbosity(cli.quiet, cli.verbose).to_string(),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let code = match cli.command {
        Commands::Serve { port, host } => {
            serve(&host, port).await?;
            ExitCode::SUCCESS
        }
        Commands::SmokeTest(args) => cli::smoke::run_smoke_test(args, cli.json).await?,
    };

    shutdown_tracing();
    Ok(code)
}

async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::from_env();
    let config = state.handler.config();
    if config.memory_id.is_none() {
        tracing::warn!("BEDROCK_AGENTCORE_MEMORY_ID is not set; invocations will return an error");
    }
    tracing::info!(region = %config.region, model = %config.model_id, "Runtime configuration");

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} agentmem runtime listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

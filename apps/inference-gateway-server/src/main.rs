mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use inference_gateway::{GatewayServer, HttpPredictClient, ShutdownSignals, ShutdownTrigger};

use crate::config::{AppConfig, CliOverrides};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Inference Gateway - gRPC Predict to HTTP prediction backend bridge
#[derive(Parser)]
#[command(name = "inference-gateway-server")]
#[command(about = "Inference Gateway - forwards gRPC Predict calls to an HTTP prediction backend")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// gRPC listen address (overrides config). `:50051` binds all IPv4 interfaces;
    /// use `[::]:50051` for IPv6 (dual-stack where the OS allows) or `127.0.0.1:50051`
    /// for loopback only
    #[arg(long)]
    listen: Option<String>,

    /// gRPC port on all IPv4 interfaces (overrides config; `--listen` wins)
    #[arg(short, long)]
    port: Option<u16>,

    /// Metrics and health listen address (overrides config)
    #[arg(long)]
    metrics_listen: Option<String>,

    /// Prediction backend URL (overrides config)
    #[arg(long)]
    downstream_url: Option<String>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (INFERENCE_GATEWAY__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        listen: cli.listen.clone(),
        port: cli.port,
        metrics_listen: cli.metrics_listen.clone(),
        downstream_url: cli.downstream_url.clone(),
    });

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    logging::init_logging(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("checking configuration");
    config.validate()?;
    println!("Configuration is valid");
    println!("{}", config.to_json()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;
    let gateway_config = config.gateway();

    let backend = HttpPredictClient::new(&gateway_config.downstream)?;
    tracing::info!(
        downstream = %backend.url(),
        timeout = ?gateway_config.downstream.timeout,
        "inference gateway starting"
    );

    let signals = ShutdownSignals::install().context("failed to install signal handlers")?;
    let server = GatewayServer::bind(&gateway_config, Arc::new(backend))
        .await
        .context("failed to start listeners")?;

    let report = server
        .serve(async move {
            signals.recv().await;
        })
        .await;

    match report.trigger {
        ShutdownTrigger::Requested => {
            tracing::info!("inference gateway stopped");
            Ok(())
        }
        ShutdownTrigger::ListenerExited { listener, error } => {
            anyhow::bail!("{listener} listener stopped unexpectedly: {error}")
        }
    }
}

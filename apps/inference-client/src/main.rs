use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use inference_gateway_sdk::{GrpcClientConfig, InferenceClientV1, InferenceGrpcClient};

/// Issue one Predict call against an inference gateway
#[derive(Parser, Debug)]
#[command(name = "inference-client")]
#[command(version)]
struct Cli {
    /// Gateway address
    #[arg(long, default_value = "http://localhost:50051")]
    addr: String,

    /// Model name passed through to the prediction backend
    #[arg(long)]
    model: String,

    /// Input vector as a JSON array, e.g. '[1.0, 2.0, 3.0]'
    #[arg(long)]
    input: String,

    /// Call deadline
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_input(raw: &str) -> Result<Vec<f64>> {
    serde_json::from_str(raw).context("--input must be a JSON array of numbers")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let input = parse_input(&cli.input)?;
    let cfg = GrpcClientConfig::default().with_rpc_timeout(cli.timeout);

    let client = InferenceGrpcClient::connect(cli.addr.clone(), &cfg).await?;
    tracing::info!(addr = %cli.addr, model = %cli.model, input_len = input.len(), "sending predict");

    let prediction = client.predict(&cli.model, &input).await?;

    println!("output: {}", serde_json::to_string(&prediction.output)?);
    println!("status: {}", prediction.status);
    Ok(())
}

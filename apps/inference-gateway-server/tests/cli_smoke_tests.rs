#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the inference-gateway-server binary
//!
//! These tests verify help and version output, configuration layering and
//! validation, startup failure when a port is taken, and clean exit on
//! termination signals.

use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

/// Helper to run the server binary with given arguments
fn run_server(args: &[&str]) -> std::process::Output {
    run_server_with_env(args, &[])
}

fn run_server_with_env(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_inference-gateway-server"))
        .args(args)
        .envs(envs.iter().copied())
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute inference-gateway-server")
}

fn write_config(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("gateway.yaml");
    std::fs::write(&path, contents).expect("Failed to write file");
    path.to_str().unwrap().to_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--listen"), "Should mention listen option");
    assert!(
        stdout.contains("all IPv4 interfaces"),
        "Should say which interfaces `:PORT` binds"
    );
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("inference-gateway-server"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_check_with_defaults() {
    let output = run_server(&["check"]);

    assert!(
        output.status.success(),
        "Default configuration should be valid: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
}

#[test]
fn test_print_config_defaults_as_json() {
    let output = run_server(&["--print-config"]);

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server"]["listen_addr"], ":50051");
    assert_eq!(config["server"]["metrics_addr"], ":9090");
    assert_eq!(config["downstream"]["url"], "http://localhost:8080/predict");
    assert_eq!(config["downstream"]["timeout"], "10s");
    assert_eq!(config["shutdown"]["grpc_grace"], "10s");
}

#[test]
fn test_config_layers_and_overrides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        r#"
server:
  listen_addr: ":7000"
downstream:
  url: "http://from-file:8080/predict"
  timeout: "2s"
"#,
    );

    let output = run_server_with_env(
        &["--config", &config_path, "-p", "6000", "--print-config"],
        &[("INFERENCE_GATEWAY__DOWNSTREAM__URL", "http://from-env:8080/predict")],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server"]["listen_addr"], ":6000");
    assert_eq!(config["downstream"]["url"], "http://from-env:8080/predict");
    assert_eq!(config["downstream"]["timeout"], "2s");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(
        !output.status.success(),
        "Should fail when config file doesn't exist"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn test_cli_config_validation_unknown_key() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "downstream:\n  retries: 3\n");

    let output = run_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Unknown keys should be rejected");
}

#[test]
fn test_cli_config_validation_bad_url() {
    let output = run_server(&["--downstream-url", "ftp://model/predict", "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("downstream.url"), "{stderr}");
}

#[tokio::test]
async fn test_run_fails_when_port_is_taken() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_inference-gateway-server"));
    cmd.args(["--listen", &addr, "--metrics-listen", "127.0.0.1:0", "run"])
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let child = cmd.spawn().unwrap();

    let output = timeout(Duration::from_secs(10), child.wait_with_output())
        .await
        .expect("server should exit instead of serving")
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to bind gRPC listener"), "{stderr}");
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn health_ok(addr: &str) -> bool {
    let Ok(mut stream) = tokio::net::TcpStream::connect(addr).await else {
        return false;
    };
    let request = b"GET /health HTTP/1.1\r\nHost: gateway\r\nConnection: close\r\n\r\n";
    if stream.write_all(request).await.is_err() {
        return false;
    }
    let mut response = String::new();
    stream.read_to_string(&mut response).await.is_ok() && response.starts_with("HTTP/1.1 200")
}

async fn assert_clean_exit_on(signal: &str) {
    let grpc = format!("127.0.0.1:{}", free_port());
    let metrics = format!("127.0.0.1:{}", free_port());

    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_inference-gateway-server"));
    cmd.args(["--listen", &grpc, "--metrics-listen", &metrics, "run"])
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let child = cmd.spawn().unwrap();
    let pid = child.id().unwrap().to_string();

    let started = timeout(Duration::from_secs(10), async {
        while !health_ok(&metrics).await {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(started.is_ok(), "server never became healthy");

    let status = Command::new("kill").args([signal, &pid]).status().unwrap();
    assert!(status.success());

    let output = timeout(Duration::from_secs(15), child.wait_with_output())
        .await
        .expect("server should exit within the grace period")
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("shutdown signal received"), "{stderr}");
    assert!(stderr.contains("inference gateway stopped"), "{stderr}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_exits_cleanly_on_sigterm() {
    assert_clean_exit_on("-TERM").await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_exits_cleanly_on_sigint() {
    assert_clean_exit_on("-INT").await;
}

//! Configuration for the inference gateway.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Full gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub downstream: DownstreamConfig,
    pub shutdown: ShutdownConfig,
}

/// Listener addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// gRPC listen address. `:PORT` binds all interfaces.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Metrics and health listen address.
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

/// Prediction backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DownstreamConfig {
    /// Full URL of the backend predict endpoint.
    #[serde(default = "default_downstream_url")]
    pub url: String,

    /// Hard bound on a single forwarded call, independent of the caller deadline.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Request/response bodies above this many bytes are truncated in logs.
    #[serde(default = "default_log_body_limit")]
    pub log_body_limit: usize,

    /// Idle keep-alive connections kept per backend host.
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

/// Grace periods for ordered shutdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownConfig {
    #[serde(default = "default_grace", with = "humantime_serde")]
    pub metrics_grace: Duration,

    #[serde(default = "default_grace", with = "humantime_serde")]
    pub grpc_grace: Duration,
}

fn default_listen_addr() -> String {
    ":50051".to_owned()
}

fn default_metrics_addr() -> String {
    ":9090".to_owned()
}

fn default_downstream_url() -> String {
    "http://localhost:8080/predict".to_owned()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_log_body_limit() -> usize {
    4096
}

fn default_pool_max_idle_per_host() -> usize {
    10
}

fn default_grace() -> Duration {
    Duration::from_secs(10)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: default_downstream_url(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            log_body_limit: default_log_body_limit(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            metrics_grace: default_grace(),
            grpc_grace: default_grace(),
        }
    }
}

impl GatewayConfig {
    /// Validate values that serde cannot check on its own.
    ///
    /// # Errors
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        parse_listen_addr(&self.server.listen_addr).context("server.listen_addr")?;
        parse_listen_addr(&self.server.metrics_addr).context("server.metrics_addr")?;

        let url = reqwest::Url::parse(&self.downstream.url)
            .with_context(|| format!("downstream.url: invalid URL '{}'", self.downstream.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("downstream.url: unsupported scheme '{}'", url.scheme());
        }
        if self.downstream.timeout.is_zero() {
            bail!("downstream.timeout must be greater than zero");
        }
        if self.downstream.connect_timeout.is_zero() {
            bail!("downstream.connect_timeout must be greater than zero");
        }
        Ok(())
    }
}

/// Parse a listen address.
///
/// Accepts `HOST:PORT` as well as `:PORT`, which binds all IPv4 interfaces.
///
/// # Errors
/// Returns an error if the address cannot be parsed or resolved.
pub fn parse_listen_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    let addr = addr.trim();
    let normalized = match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_owned(),
    };

    if let Ok(parsed) = normalized.parse::<SocketAddr>() {
        return Ok(parsed);
    }

    normalized
        .to_socket_addrs()
        .with_context(|| format!("invalid listen address '{addr}'"))?
        .next()
        .with_context(|| format!("listen address '{addr}' did not resolve"))
}

/// Serde adapter for human-readable durations (`"10s"`, `"250ms"`).
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    /// # Errors
    /// Fails if the serializer rejects the string.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    /// # Errors
    /// Fails if the value is not a string humantime can parse.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}

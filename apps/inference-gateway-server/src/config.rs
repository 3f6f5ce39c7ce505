//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, YAML file, environment
//! (`INFERENCE_GATEWAY__SECTION__KEY`), command-line overrides.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use inference_gateway::{DownstreamConfig, GatewayConfig, ServerConfig, ShutdownConfig};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "INFERENCE_GATEWAY__";

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub downstream: DownstreamConfig,
    pub shutdown: ShutdownConfig,
    pub logging: LoggingConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_level() -> String {
    "info".to_owned()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Values taken from the command line, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub metrics_listen: Option<String>,
    pub downstream_url: Option<String>,
}

impl AppConfig {
    /// Load defaults, then the optional YAML file, then the environment.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or any layer holds invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("failed to load configuration")
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Apply command-line overrides. `--listen` wins over `--port`.
    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.listen_addr = format!(":{port}");
        }
        if let Some(listen) = &overrides.listen {
            self.server.listen_addr.clone_from(listen);
        }
        if let Some(metrics_listen) = &overrides.metrics_listen {
            self.server.metrics_addr.clone_from(metrics_listen);
        }
        if let Some(url) = &overrides.downstream_url {
            self.downstream.url.clone_from(url);
        }
    }

    /// The part of the configuration the gateway itself consumes.
    #[must_use]
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            server: self.server.clone(),
            downstream: self.downstream.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// # Errors
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.gateway().validate()?;
        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("logging.level: invalid filter '{}'", self.logging.level))?;
        Ok(())
    }

    /// Pretty JSON rendering for `--print-config` and `check`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }
}

//! Layered configuration: TOML file, then `MGDWATCH_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use mgdwatch_adapters::mgd::MgdAdapter;
use mgdwatch_adapters::AdapterError;
use mgdwatch_sdk::{Format, Output};
use serde::Deserialize;
use thiserror::Error;

use crate::duration::parse_duration;

/// Prefix for environment overrides, e.g. `MGDWATCH_INTERVAL=30s`.
pub const ENV_PREFIX: &str = "MGDWATCH";

/// Sample configuration printed by `--sample-config`.
pub const SAMPLE_CONFIG: &str = r#"# mgdwatch configuration

## An array of address to gather stats about. Specify an ip on hostname
## with optional port. ie localhost, 10.0.0.1:50000, etc.
## An empty list polls ":50000".
servers = ["localhost:50000"]

## Time between gather passes.
interval = "10s"

[output]
## "line" (InfluxDB line protocol) or "json".
format = "line"

## Append to a file instead of writing to stdout.
# path = "mgd.out"

## Also send each batch to a TCP listener (e.g. a telegraf socket_listener).
# tcp = "localhost:8094"
"#;

/// Errors raised while loading or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The interval is not a positive duration.
    #[error("Invalid interval '{0}'")]
    InvalidInterval(String),

    /// Unknown output format.
    #[error("Invalid output format: {0}")]
    InvalidFormat(String),

    /// The adapter could not be built.
    #[error("Failed to build adapter: {0}")]
    Adapter(#[from] AdapterError),
}

/// Output section of the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub tcp: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
            tcp: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            interval: default_interval(),
            output: OutputSettings::default(),
        }
    }
}

fn default_interval() -> String {
    "10s".to_string()
}

fn default_format() -> String {
    "line".to_string()
}

impl Settings {
    /// Load settings from an optional TOML file plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder.add_source(env).build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Parsed polling interval.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        match parse_duration(&self.interval) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::InvalidInterval(self.interval.clone())),
        }
    }

    /// Parsed output format.
    pub fn format(&self) -> Result<Format, ConfigError> {
        self.output
            .format
            .parse()
            .map_err(ConfigError::InvalidFormat)
    }

    /// Outputs described by the `[output]` section.
    ///
    /// Stdout is used unless a file path is set; TCP is added on top.
    pub fn outputs(&self) -> Result<Vec<Output>, ConfigError> {
        let format = self.format()?;
        let mut outputs = Vec::new();

        match &self.output.path {
            Some(path) => outputs.push(Output::file(path).with_format(format)),
            None => outputs.push(Output::stdout().with_format(format)),
        }
        if let Some(addr) = &self.output.tcp {
            outputs.push(Output::tcp(addr).with_format(format));
        }

        Ok(outputs)
    }

    /// Build the mgd adapter for the configured servers.
    pub fn adapter(&self) -> Result<MgdAdapter, ConfigError> {
        Ok(MgdAdapter::builder()
            .servers(self.servers.iter().cloned())
            .build()?)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("servers")
        .try_parsing(true)
}

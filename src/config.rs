//! Server configuration.
//!
//! Loaded from an optional YAML file named by `SWITCHYARD_CONFIG`, with the
//! `LISTEN=<host>:<port>` environment variable overriding the bind address.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the path of the YAML config file.
pub const CONFIG_ENV: &str = "SWITCHYARD_CONFIG";

/// Environment variable overriding `server.host` and `server.port`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid listen address {0:?}, expected <host>:<port>")]
    InvalidListen(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: Vec<StaticMountConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum concurrently served connections; `None` is unbounded.
    pub max_connections: Option<usize>,
    /// Bytes requested per socket read.
    pub read_buffer_size: usize,
    /// Keep reading until `Content-Length` bytes of body have arrived.
    pub wait_for_body: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_connections: None,
            read_buffer_size: 4096,
            wait_for_body: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticMountConfig {
    pub prefix: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// How many connections may be served at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// One task per accepted connection, no limit.
    #[default]
    Unbounded,
    /// At most `n` connections in flight; accepting waits for a free slot.
    Bounded(usize),
}

impl ServerConfig {
    pub fn concurrency(&self) -> ConcurrencyPolicy {
        match self.max_connections {
            Some(n) if n > 0 => ConcurrencyPolicy::Bounded(n),
            _ => ConcurrencyPolicy::Unbounded,
        }
    }

    /// Read size with a floor so a zero in the file cannot stall reads.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size.max(64)
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// File from `SWITCHYARD_CONFIG` (or defaults), then the `LISTEN` override.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };

        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            config.apply_listen(&listen)?;
        }

        Ok(config)
    }

    /// Overrides host and port from a `<host>:<port>` string.
    pub fn apply_listen(&mut self, listen: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidListen(listen.to_string());

        let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        self.server.host = host.to_string();
        self.server.port = port;
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

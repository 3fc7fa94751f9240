/**
 * Server Configuration
 *
 * This module loads and validates the server configuration: listen port,
 * which store backend to open, and the stream notifier timers.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 *
 * 1. Built-in defaults
 * 2. Optional TOML file named by `MSGRELAY_CONFIG`
 * 3. Environment variables (a `.env` file is loaded by the binary)
 *
 * | Variable                  | TOML key         | Default                               |
 * |---------------------------|------------------|---------------------------------------|
 * | `SERVER_PORT`             | `port`           | `3000`                                |
 * | `MSGRELAY_STORE`          | `store`          | `postgres` if a URL is set, else `file` |
 * | `MSGRELAY_DATA_PATH`      | `data_path`      | `<data dir>/msgrelay/store.json`      |
 * | `DATABASE_URL`            | `database_url`   | none                                  |
 * | `MSGRELAY_HEARTBEAT_SECS` | `heartbeat_secs` | `25`                                  |
 * | `MSGRELAY_POLL_MILLIS`    | `poll_millis`    | `2000`                                |
 *
 * # Validation
 *
 * The poll interval must be non-zero and strictly shorter than the
 * heartbeat interval. A postgres store needs a database URL.
 */
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::backend::realtime::notifier::{NotifierConfig, DEFAULT_EVENT_BUFFER};

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_VAR: &str = "MSGRELAY_CONFIG";

/// Which durable backend holds the data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local, lost on restart
    Memory,
    /// One JSON document on disk
    File { path: PathBuf },
    /// Single JSONB row in PostgreSQL
    Postgres { url: String },
}

impl StoreConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Postgres { .. } => "postgres",
        }
    }
}

/// Resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub notifier: NotifierConfig,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("unknown store kind: {0} (expected memory, file or postgres)")]
    UnknownStore(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid intervals: {0}")]
    InvalidIntervals(String),
}

/// On-disk TOML layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    store: Option<String>,
    data_path: Option<PathBuf>,
    database_url: Option<String>,
    heartbeat_secs: Option<u64>,
    poll_millis: Option<u64>,
    event_buffer: Option<usize>,
}

impl ServerConfig {
    /// Create a new ServerConfigBuilder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load from the optional TOML file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = match lookup(CONFIG_PATH_VAR) {
            Some(path) => ServerConfigBuilder::from_file(Path::new(&path))?,
            None => ServerConfigBuilder::default(),
        };

        if let Some(port) = lookup("SERVER_PORT") {
            builder = builder.port(parse_value("SERVER_PORT", &port)?);
        }
        if let Some(store) = lookup("MSGRELAY_STORE") {
            builder.store = Some(store);
        }
        if let Some(path) = lookup("MSGRELAY_DATA_PATH") {
            builder = builder.data_path(path);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(secs) = lookup("MSGRELAY_HEARTBEAT_SECS") {
            let secs: u64 = parse_value("MSGRELAY_HEARTBEAT_SECS", &secs)?;
            builder = builder.heartbeat_interval(Duration::from_secs(secs));
        }
        if let Some(millis) = lookup("MSGRELAY_POLL_MILLIS") {
            let millis: u64 = parse_value("MSGRELAY_POLL_MILLIS", &millis)?;
            builder = builder.poll_interval(Duration::from_millis(millis));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let NotifierConfig {
            heartbeat_interval,
            poll_interval,
            event_buffer,
        } = self.notifier;

        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidIntervals(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if poll_interval >= heartbeat_interval {
            return Err(ConfigError::InvalidIntervals(format!(
                "poll interval {:?} must be shorter than heartbeat interval {:?}",
                poll_interval, heartbeat_interval
            )));
        }
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_buffer",
                value: "0".to_string(),
            });
        }
        if let StoreConfig::Postgres { url } = &self.store {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingValue("DATABASE_URL"));
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Default JSON store location under the platform data directory
pub fn default_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("msgrelay").join("store.json"))
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    port: Option<u16>,
    store: Option<String>,
    data_path: Option<PathBuf>,
    database_url: Option<String>,
    heartbeat_interval: Option<Duration>,
    poll_interval: Option<Duration>,
    event_buffer: Option<usize>,
}

impl ServerConfigBuilder {
    /// Seed a builder from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("[Server] Loaded configuration from {}", path.display());
        Self::from_toml(&raw)
    }

    /// Seed a builder from TOML text
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(raw)?;
        Ok(Self {
            port: file.port,
            store: file.store,
            data_path: file.data_path,
            database_url: file.database_url,
            heartbeat_interval: file.heartbeat_secs.map(Duration::from_secs),
            poll_interval: file.poll_millis.map(Duration::from_millis),
            event_buffer: file.event_buffer,
        })
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Use the in-memory store
    pub fn memory_store(mut self) -> Self {
        self.store = Some("memory".to_string());
        self
    }

    /// Use the JSON file store at `path`
    pub fn file_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = Some("file".to_string());
        self.data_path = Some(path.into());
        self
    }

    /// Use the PostgreSQL store at `url`
    pub fn postgres_store(mut self, url: impl Into<String>) -> Self {
        self.store = Some("postgres".to_string());
        self.database_url = Some(url.into());
        self
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = Some(buffer);
        self
    }

    /// Resolve defaults and validate
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let kind = match self.store.as_deref().map(str::trim) {
            Some(kind) => kind.to_ascii_lowercase(),
            None if self.database_url.is_some() => "postgres".to_string(),
            None => "file".to_string(),
        };

        let store = match kind.as_str() {
            "memory" => StoreConfig::Memory,
            "file" => {
                let path = self
                    .data_path
                    .or_else(default_data_path)
                    .ok_or(ConfigError::MissingValue("MSGRELAY_DATA_PATH"))?;
                StoreConfig::File { path }
            }
            "postgres" => {
                let url = self
                    .database_url
                    .ok_or(ConfigError::MissingValue("DATABASE_URL"))?;
                StoreConfig::Postgres { url }
            }
            other => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let defaults = NotifierConfig::default();
        let config = ServerConfig {
            port: self.port.unwrap_or(DEFAULT_PORT),
            store,
            notifier: NotifierConfig {
                heartbeat_interval: self.heartbeat_interval.unwrap_or(defaults.heartbeat_interval),
                poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
                event_buffer: self.event_buffer.unwrap_or(DEFAULT_EVENT_BUFFER),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

//! Server configuration.
//!
//! Read from a YAML file (path in `FILMS_CONFIG`, default `config/films.yaml`),
//! then patched from the environment. Every field has a default, so a missing
//! file yields a runnable in-memory setup.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use storage::PostgresConfig;

pub const CONFIG_PATH_VAR: &str = "FILMS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/films.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for one request; the search is cancelled when it passes
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend '{other}' (expected memory or postgres)"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory with the `.dat` files for the memory backend
    pub data_dir: PathBuf,
    pub health_check_interval_secs: u64,
    pub postgres: PostgresConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("data/catalog"),
            health_check_interval_secs: 30,
            postgres: PostgresConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,server=debug,search=debug,tower_http=debug".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load from `FILMS_CONFIG` (or the default path) and apply env overrides
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Patch values from `FILMS_HOST`, `FILMS_PORT`, `FILMS_STORAGE_BACKEND`
    /// and `DATABASE_URL`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FILMS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FILMS_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("FILMS_PORT is not a port number: '{port}'"))?;
        }
        if let Some(backend) = lookup("FILMS_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.postgres.url = Some(url);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Per-request search deadline, at least one second
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs.max(1))
    }
}

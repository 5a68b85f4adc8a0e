//! Configuration module - service credentials, read-only mode and listener settings

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default MCP transport
pub const DEFAULT_TRANSPORT: &str = "sse";

/// Default bind host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port, also the port declared by the container image
pub const DEFAULT_PORT: u16 = 8080;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_RADARR_URL: &str = "http://localhost:7878";
pub const DEFAULT_SONARR_URL: &str = "http://localhost:8989";
pub const DEFAULT_BASE_PATH: &str = "/api/v3";

/// Environment variable overriding the read-only flag of the config file
pub const ENV_READ_ONLY: &str = "READ_ONLY";

/// Connection settings for one Radarr or Sonarr instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub api_key: String,
    pub url: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl ServiceConfig {
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into(),
            base_path: default_base_path(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Root of the REST API, e.g. `http://localhost:7878/api/v3`
    pub fn api_root(&self) -> String {
        let url = self.url.trim().trim_end_matches('/');
        let base = self.base_path.trim().trim_matches('/');
        if base.is_empty() {
            url.to_string()
        } else {
            format!("{}/{}", url, base)
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub radarr_config: ServiceConfig,
    pub sonarr_config: ServiceConfig,
    #[serde(default)]
    pub read_only: bool,
}

impl Config {
    pub fn new(radarr_config: ServiceConfig, sonarr_config: ServiceConfig) -> Self {
        Self {
            radarr_config,
            sonarr_config,
            read_only: false,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Check whether a flag value means "enabled": true, 1, yes or on (case-insensitive)
pub fn is_truthy(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}

/// Load configuration from a JSON file, falling back to environment variables
/// when the file does not exist. `READ_ONLY` always wins over the file value.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup
pub fn load_config_with_env<F>(path: impl AsRef<Path>, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let path = path.as_ref();

    let mut config = if path.is_file() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        config
    } else {
        debug!(
            "Config file {} not found, using environment variables",
            path.display()
        );
        config_from_env(&env)
    };

    if let Some(value) = env(ENV_READ_ONLY) {
        config.read_only = is_truthy(&value);
    }

    Ok(config)
}

fn config_from_env<F>(env: &F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let service = |prefix: &str, default_url: &str| {
        let non_empty = |key: String| env(&key).filter(|v| !v.trim().is_empty());
        ServiceConfig {
            api_key: env(&format!("{}_API_KEY", prefix)).unwrap_or_default(),
            url: non_empty(format!("{}_URL", prefix)).unwrap_or_else(|| default_url.to_string()),
            base_path: non_empty(format!("{}_BASE_PATH", prefix))
                .unwrap_or_else(default_base_path),
        }
    };

    Config::new(
        service("RADARR", DEFAULT_RADARR_URL),
        service("SONARR", DEFAULT_SONARR_URL),
    )
}

/// Write configuration as pretty JSON
pub fn save_config(config: &Config, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Wire transport for MCP
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransportKind {
    Sse,
    Stdio,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "stdio" => Ok(Self::Stdio),
            other => Err(anyhow!(
                "Unsupported transport '{}' (expected 'sse' or 'stdio')",
                other
            )),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sse => write!(f, "sse"),
            Self::Stdio => write!(f, "stdio"),
        }
    }
}

/// Listener settings resolved from MCP_TRANSPORT, MCP_HOST and MCP_PORT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::Sse,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    pub fn new(transport: &str, host: &str, port: u16) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        Ok(Self {
            transport: transport.parse()?,
            host: host.to_string(),
            port,
        })
    }

    /// Address to bind. IP literals (bracketed IPv6 included) are used as
    /// is; hostnames are resolved and the first address wins.
    pub async fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        tokio::net::lookup_host((host, self.port))
            .await
            .with_context(|| format!("Failed to resolve host '{}'", self.host))?
            .next()
            .ok_or_else(|| anyhow!("Host '{}' resolved to no addresses", self.host))
    }
}

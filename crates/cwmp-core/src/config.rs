//! Process configuration
//!
//! The agent reads a TOML file with three sections:
//!
//! ```toml
//! [local]
//! event = 1            # event code reported by the first Inform
//! port = 7547          # connection request listener
//!
//! [acs]
//! scheme = "https"
//! hostname = "acs.example.com"
//! port = 7547
//! path = "/cwmp"
//! username = "cpe"
//! password = "secret"
//! ssl_verify = "disabled"
//!
//! [logging]
//! level = "debug"
//! spans = true
//! ```
//!
//! [`FileConfigLoader`] implements [`ConfigLoader`]: a reload re-reads the
//! file and swaps the new configuration in atomically, so the transport
//! always sees either the old or the new ACS settings, never a mix.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};
use url::Url;

use crate::adapters::ConfigLoader;
use crate::errors::ConfigError;
use crate::event::EventCode;
use crate::logging::LoggingConfig;

/// Complete agent configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub local: LocalConfig,
    pub acs: AcsConfig,
    pub logging: LogSettings,
}

impl AgentConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Settings of the device side
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Numeric event code for the first Inform after start
    pub event: i64,
    /// Interface the connection request listener binds to
    pub interface: Option<String>,
    /// Connection request listener port
    pub port: u16,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            event: 0,
            interface: None,
            port: 7547,
        }
    }
}

impl LocalConfig {
    pub fn initial_event(&self) -> EventCode {
        EventCode::from_code(self.event)
    }
}

/// ACS connection settings
///
/// Each field owns its value; replacing a credential drops the old one.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AcsConfig {
    pub scheme: String,
    pub hostname: String,
    pub port: u16,
    pub path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_cert: Option<PathBuf>,
    pub ssl_cacert: Option<PathBuf>,
    /// Verify the ACS certificate (`"disabled"` turns verification off)
    #[serde(deserialize_with = "deserialize_ssl_verify")]
    pub ssl_verify: bool,
}

impl Default for AcsConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            hostname: "localhost".to_string(),
            port: 80,
            path: "/".to_string(),
            username: None,
            password: None,
            ssl_cert: None,
            ssl_cacert: None,
            ssl_verify: true,
        }
    }
}

impl AcsConfig {
    /// ACS endpoint assembled from scheme, host, port and path
    pub fn url(&self) -> Result<Url, ConfigError> {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let raw = format!("{}://{}:{}{}", self.scheme, self.hostname, self.port, path);
        Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

// Credentials never reach the logs
impl fmt::Debug for AcsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcsConfig")
            .field("scheme", &self.scheme)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ssl_cert", &self.ssl_cert)
            .field("ssl_cacert", &self.ssl_cacert)
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

fn deserialize_ssl_verify<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(flag) => flag,
        Raw::Text(text) => text != "disabled",
    })
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
    /// Log span open/close events
    pub spans: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            spans: false,
        }
    }
}

impl LogSettings {
    pub fn to_logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        LoggingConfig::from_settings(self)
    }
}

/// Reloads [`AgentConfig`] from its file on demand
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    path: PathBuf,
    current: Arc<ArcSwap<AgentConfig>>,
}

impl FileConfigLoader {
    /// Load the file once; fails if it cannot be read or parsed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = AgentConfig::from_file(&path)?;
        debug!("loaded configuration from {}", path.display());
        Ok(Self {
            path,
            current: Arc::new(ArcSwap::from_pointee(config)),
        })
    }

    /// The configuration as of the last successful load
    pub fn current(&self) -> Arc<AgentConfig> {
        self.current.load_full()
    }

    /// Shared handle for components that must observe reloads
    pub fn shared(&self) -> Arc<ArcSwap<AgentConfig>> {
        Arc::clone(&self.current)
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn reload(&self) -> Result<(), ConfigError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let config = AgentConfig::from_toml_str(&contents)?;
        config.acs.url()?;
        self.current.store(Arc::new(config));
        info!("reloaded configuration from {}", self.path.display());
        Ok(())
    }
}

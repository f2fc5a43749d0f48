//! # Configuration System
//!
//! YAML configuration for the pyramid tools:
//!
//! - Reader connection (driver, agent address, connect timeout)
//! - Read path settings (samples acquired per read)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `PYRAMID_CONFIG` environment variable
//! 2. `./pyramid.yaml` (current directory)
//! 3. `~/.config/pyramid/config.yaml` (user config)
//! 4. `/etc/pyramid/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! device:
//!   driver: "agent"
//!   address: "192.168.1.40:6125"
//!   connect_timeout_ms: 2000
//!
//! read:
//!   sample_count: 30000
//!
//! logging:
//!   level: "debug"
//!   format: "compact"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_AGENT_PORT;
use crate::logging::LogConfig;
use crate::read::DEFAULT_SAMPLE_COUNT;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "PYRAMID_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read configuration file
    #[error("failed to read config: {0}")]
    ReadError(String),
    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    ParseError(String),
    /// Invalid configuration value
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// How the reader is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDriver {
    /// Reader agent over TCP
    #[default]
    Agent,
    /// In-process simulated reader and blank tag
    Simulator,
}

/// Reader connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Driver name (agent, simulator)
    pub driver: DeviceDriver,
    /// Agent address as host:port
    pub address: String,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: DeviceDriver::Agent,
            address: format!("127.0.0.1:{}", DEFAULT_AGENT_PORT),
            connect_timeout_ms: 2000,
        }
    }
}

/// Read path configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Samples acquired before demodulation
    pub sample_count: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

/// Complete pyramid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Configuration version
    pub version: String,
    /// Reader connection
    pub device: DeviceConfig,
    /// Read path
    pub read: ReadConfig,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            device: DeviceConfig::default(),
            read: ReadConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl PyramidConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `PYRAMID_CONFIG` environment variable
    /// 2. `./pyramid.yaml`
    /// 3. `~/.config/pyramid/config.yaml`
    /// 4. `/etc/pyramid/config.yaml`
    ///
    /// Returns default config if no file is found. A `PYRAMID_CONFIG` that
    /// points at a missing file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points at {}",
                    CONFIG_ENV_VAR,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./pyramid.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "pyramid") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/pyramid/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.driver == DeviceDriver::Agent && self.device.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "device.address is required for the agent driver".to_string(),
            ));
        }

        if self.device.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.read.sample_count == 0 {
            return Err(ConfigError::ValidationError(
                "sample_count must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

//! TOML configuration for the `blobscrub` binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("storage.root_directory must not be empty")]
    MissingRootDirectory,

    #[error("sub-path route must start with '/': {0}")]
    InvalidRoute(String),

    #[error("sub-path {0} has an empty root_directory")]
    EmptySubPathRoot(String),

    #[error("sub-path {0} shares the default root directory")]
    SharedRootDirectory(String),

    #[error("unknown log level: {0}")]
    InvalidLogLevel(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrubConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_directory: PathBuf,
    #[serde(default)]
    pub sub_paths: BTreeMap<String, SubPathConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubPathConfig {
    pub root_directory: PathBuf,
}

/// Where the registry serves HTTP when it is running.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

impl HttpConfig {
    /// URL of the distribution API base endpoint.
    pub fn probe_url(&self) -> String {
        format!("http://{}:{}/v2/", self.address, self.port)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl LogConfig {
    pub fn level(&self) -> Result<Option<Level>, ConfigError> {
        self.level
            .as_deref()
            .map(|l| l.parse().map_err(|_| ConfigError::InvalidLogLevel(l.to_string())))
            .transpose()
    }
}

impl ScrubConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = text.parse()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = &self.storage.root_directory;
        if root.as_os_str().is_empty() {
            return Err(ConfigError::MissingRootDirectory);
        }
        for (route, sub) in &self.storage.sub_paths {
            if !route.starts_with('/') {
                return Err(ConfigError::InvalidRoute(route.clone()));
            }
            if sub.root_directory.as_os_str().is_empty() {
                return Err(ConfigError::EmptySubPathRoot(route.clone()));
            }
            if sub.root_directory == *root {
                return Err(ConfigError::SharedRootDirectory(route.clone()));
            }
        }
        self.log.level()?;
        Ok(())
    }
}

impl std::str::FromStr for ScrubConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

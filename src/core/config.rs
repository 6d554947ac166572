// Service configuration, read once at startup from the environment

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_STAGING_ROOT: &str = "temp_uploads";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid bind address {addr:?}: {source}")]
    InvalidBindAddr {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("Storage not configured (missing {0})")]
    StorageNotConfigured(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Where sessions are staged before upload
    pub staging_root: PathBuf,
    /// Hugging Face access token; uploads are disabled without it
    pub storage_token: Option<String>,
    /// Target dataset repository, e.g. "username/dataset-name"
    pub dataset_repo: Option<String>,
    /// Address the HTTP boundary listens on
    pub bind_addr: SocketAddr,
    /// Hub endpoint; overridable for tests and mirrors
    pub hub_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from(DEFAULT_STAGING_ROOT),
            storage_token: None,
            dataset_repo: None,
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind addr parses"),
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
        }
    }
}

/// The two settings the commit path cannot run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub token: String,
    pub dataset_repo: String,
}

impl Config {
    /// Read configuration from the environment. Unset variables fall back to
    /// defaults; the storage settings stay `None` so the ingest path can fail
    /// fast with a configuration error instead of a late upload failure.
    pub fn from_env() -> ConfigResult<Self> {
        let staging_root = std::env::var("STAGING_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STAGING_ROOT));

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(addr) => addr
                .parse()
                .map_err(|source| ConfigError::InvalidBindAddr { addr, source })?,
            Err(_) => DEFAULT_BIND_ADDR.parse().expect("default bind addr parses"),
        };

        let hub_endpoint =
            std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_HUB_ENDPOINT.to_string());

        Ok(Self {
            staging_root,
            storage_token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            dataset_repo: std::env::var("DATASET_ID").ok().filter(|r| !r.is_empty()),
            bind_addr,
            hub_endpoint,
        })
    }

    /// True when both storage settings are present.
    pub fn storage_configured(&self) -> bool {
        self.storage_token.is_some() && self.dataset_repo.is_some()
    }

    /// The validated storage settings, or the configuration error naming the
    /// first missing one.
    pub fn storage(&self) -> ConfigResult<StorageConfig> {
        let token = self
            .storage_token
            .clone()
            .ok_or(ConfigError::StorageNotConfigured("HF_TOKEN"))?;
        let dataset_repo = self
            .dataset_repo
            .clone()
            .ok_or(ConfigError::StorageNotConfigured("DATASET_ID"))?;
        Ok(StorageConfig {
            token,
            dataset_repo,
        })
    }
}

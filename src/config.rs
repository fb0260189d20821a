// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::file_transfer::DEFAULT_STORAGE_DIR;
use crate::rabbitmq::connection::{
    ConnectionParams, DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USERNAME, DEFAULT_VHOST,
};

pub const CONFIG_FILE_NAME: &str = "RabbitFacade.json";

// Configuration structures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacadeConfig {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub file_transfer: FileTransferConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    #[serde(default = "default_timeout")]
    pub connection_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTransferConfig {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

// Default values
fn default_host() -> String { DEFAULT_HOST.to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_username() -> String { DEFAULT_USERNAME.to_string() }
fn default_password() -> String { DEFAULT_PASSWORD.to_string() }
fn default_vhost() -> String { DEFAULT_VHOST.to_string() }
fn default_timeout() -> u64 { 10_000 }
fn default_storage_dir() -> PathBuf { PathBuf::from(DEFAULT_STORAGE_DIR) }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            vhost: default_vhost(),
            connection_timeout_ms: default_timeout(),
        }
    }
}

impl Default for FileTransferConfig {
    fn default() -> Self {
        Self { storage_dir: default_storage_dir() }
    }
}

impl ConnectionConfig {
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams::new(&self.host, self.port, &self.username, &self.password)
            .with_vhost(&self.vhost)
            .with_connect_timeout(Duration::from_millis(self.connection_timeout_ms))
    }
}

impl FacadeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(anyhow!("Configuration error: connection.host cannot be empty"));
        }
        if self.connection.port == 0 {
            return Err(anyhow!("Configuration error: connection.port cannot be 0"));
        }
        Ok(())
    }
}

// Configuration loading and management functions
pub fn find_config_file() -> Result<PathBuf> {
    let local = Path::new(CONFIG_FILE_NAME);
    let nested = Path::new("config").join(CONFIG_FILE_NAME);
    let locations = [("Current directory", local.to_path_buf()), ("Config directory", nested)];

    for (location_name, path) in locations.iter() {
        if path.exists() {
            debug!("Found config file in {}: {}", location_name, path.display());
            return Ok(path.clone());
        }
    }

    // Try the user's home directory
    if let Some(home_dir) = home::home_dir() {
        let home_config = home_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if home_config.exists() {
            debug!("Found config file in home directory: {}", home_config.display());
            return Ok(home_config);
        }
    }

    Err(anyhow!(
        "Could not find {} configuration file. \
         Please create one in the current directory, config/, or your home directory.",
        CONFIG_FILE_NAME
    ))
}

pub fn load_config() -> Result<FacadeConfig> {
    let config_path = find_config_file()?;
    load_config_from(&config_path)
}

pub fn load_config_from(config_path: &Path) -> Result<FacadeConfig> {
    let config_content = fs::read_to_string(config_path)
        .context(format!("Failed to read config file at {}", config_path.display()))?;

    // Parse and validate the config structure
    let config: FacadeConfig = serde_json::from_str(&config_content)
        .context("Configuration file contains invalid JSON or missing required fields")?;
    config.validate()?;

    Ok(config)
}

pub fn create_default_config_file(path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&FacadeConfig::default())
        .context("Failed to serialize default configuration")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory at {}", parent.display()))?;
        }
    }

    fs::write(path, json)
        .context(format!("Failed to write configuration to {}", path.display()))?;

    info!("Created default configuration file at: {}", path.display());
    Ok(())
}

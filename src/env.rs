use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;

use crate::config::{ConnectionConfig, FacadeConfig, FileTransferConfig};

pub const HOST_VAR: &str = "RABBITMQ_HOST";
pub const PORT_VAR: &str = "RABBITMQ_PORT";
pub const USERNAME_VAR: &str = "RABBITMQ_USERNAME";
pub const PASSWORD_VAR: &str = "RABBITMQ_PASSWORD";
pub const VHOST_VAR: &str = "RABBITMQ_VHOST";
pub const CONNECT_TIMEOUT_VAR: &str = "RABBITMQ_CONNECT_TIMEOUT_SECONDS";
pub const STORAGE_DIR_VAR: &str = "FILE_STORAGE_DIR";

/// Builds the configuration from environment variables (and `.env`), with the
/// file defaults for anything unset.
pub fn load() -> Result<FacadeConfig> {
    dotenv().ok();
    let defaults = FacadeConfig::default();

    let connection = ConnectionConfig {
        host: string_var(HOST_VAR).unwrap_or(defaults.connection.host),
        port: parsed_var(PORT_VAR)?.unwrap_or(defaults.connection.port),
        username: string_var(USERNAME_VAR).unwrap_or(defaults.connection.username),
        password: string_var(PASSWORD_VAR).unwrap_or(defaults.connection.password),
        vhost: string_var(VHOST_VAR).unwrap_or(defaults.connection.vhost),
        connection_timeout_ms: match parsed_var::<u64>(CONNECT_TIMEOUT_VAR)? {
            Some(seconds) => seconds.checked_mul(1000).ok_or_else(|| {
                anyhow!("{} is too large, got {} seconds", CONNECT_TIMEOUT_VAR, seconds)
            })?,
            None => defaults.connection.connection_timeout_ms,
        },
    };

    let file_transfer = FileTransferConfig {
        storage_dir: string_var(STORAGE_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.file_transfer.storage_dir),
    };

    let config = FacadeConfig { connection, file_transfer };
    config.validate()?;
    Ok(config)
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match string_var(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .context(format!("{} must be a number, got '{}'", name, value)),
        None => Ok(None),
    }
}

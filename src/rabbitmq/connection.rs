use std::fmt;
use std::time::Duration;

use lapin::uri::AMQPUri;
use lapin::{Channel, Connection, ConnectionProperties};
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::errors::Result;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5672;
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
pub const DEFAULT_VHOST: &str = "/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the broker. Fixed for the lifetime of a facade.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub vhost: String,
    pub connect_timeout: Duration,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            vhost: DEFAULT_VHOST.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("vhost", &self.vhost)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ConnectionParams {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    pub fn with_vhost(mut self, vhost: &str) -> Self {
        self.vhost = vhost.to_string();
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// `host:port/vhost`, for logging.
    pub fn address(&self) -> String {
        format!("{}:{}{}", self.host, self.port, vhost_path(&self.vhost))
    }

    pub fn amqp_uri(&self) -> AMQPUri {
        let mut uri = AMQPUri::default();
        uri.authority.host = self.host.clone();
        uri.authority.port = self.port;
        uri.authority.userinfo.username = self.username.clone();
        uri.authority.userinfo.password = self.password.clone();
        uri.vhost = self.vhost.clone();
        uri
    }
}

fn vhost_path(vhost: &str) -> String {
    if vhost.starts_with('/') {
        vhost.to_string()
    } else {
        format!("/{}", vhost)
    }
}

/// Opens the connection and its single channel.
pub(crate) async fn open(params: &ConnectionParams) -> Result<(Connection, Channel)> {
    info!("Connecting to RabbitMQ at {}", params.address());

    let connection = match timeout(
        params.connect_timeout,
        Connection::connect_uri(params.amqp_uri(), ConnectionProperties::default()),
    )
    .await
    {
        Ok(Ok(connection)) => connection,
        Ok(Err(err)) => {
            error!("Failed to connect to RabbitMQ at {}: {}", params.address(), err);
            return Err(err.into());
        }
        Err(elapsed) => {
            error!(
                "Connecting to RabbitMQ at {} timed out after {:?}",
                params.address(),
                params.connect_timeout
            );
            return Err(elapsed.into());
        }
    };

    let channel = connection.create_channel().await?;
    debug!(channel_id = channel.id(), "Channel opened");

    info!("Successfully connected to RabbitMQ");
    Ok((connection, channel))
}

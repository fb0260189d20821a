// src/rabbitmq/errors.rs

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use lapin::Error as LapinError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;
use thiserror::Error;
use tokio::time::error::Elapsed;

/// Keys of the fixed validation-error catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    FileNotFound,
    InvalidExchange,
}

impl ErrorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKey::FileNotFound => "file_not_found",
            ErrorKey::InvalidExchange => "invalid_exchange",
        }
    }

    /// The human-readable catalog message for this key.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKey::FileNotFound => "File Do not exists. Please provide a valid file",
            ErrorKey::InvalidExchange => "Please provide a valid exchange name",
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown error key: {0}")]
pub struct UnknownErrorKey(pub String);

impl FromStr for ErrorKey {
    type Err = UnknownErrorKey;

    fn from_str(key: &str) -> std::result::Result<Self, Self::Err> {
        match key {
            "file_not_found" => Ok(ErrorKey::FileNotFound),
            "invalid_exchange" => Ok(ErrorKey::InvalidExchange),
            other => Err(UnknownErrorKey(other.to_string())),
        }
    }
}

/// Shorthand for the catalog lookup.
pub fn error_string(key: ErrorKey) -> &'static str {
    key.message()
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    BrokerFailure,
    InvalidExchange,
    FileNotFound,
    InvalidPayload,
    Storage,
}

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("RabbitMQ broker error: {message}")]
    Broker {
        code: u16,
        message: String,
        trace: Vec<String>,
    },

    #[error("Connection timeout: {0}")]
    Timeout(String),

    #[error("{}: {}", ErrorKey::InvalidExchange.message(), .0)]
    InvalidExchange(String),

    #[error("{}: {}", ErrorKey::FileNotFound.message(), .0.display())]
    FileNotFound(PathBuf),

    #[error("Message serialization error: {0}")]
    Serialization(#[from] SerdeError),

    #[error("File data decoding error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid file payload: {0}")]
    InvalidPayload(String),

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),
}

// Custom Result type for facade operations
pub type Result<T> = std::result::Result<T, FacadeError>;

/// Structured form of a failure, serializable as
/// `{error_code, error_message, error_trace}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_code: u16,
    pub error_message: String,
    pub error_trace: Vec<String>,
}

impl FacadeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacadeError::Broker { .. } | FacadeError::Timeout(_) => ErrorKind::BrokerFailure,
            FacadeError::InvalidExchange(_) => ErrorKind::InvalidExchange,
            FacadeError::FileNotFound(_) => ErrorKind::FileNotFound,
            FacadeError::Serialization(_)
            | FacadeError::Decode(_)
            | FacadeError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            FacadeError::Io(_) => ErrorKind::Storage,
        }
    }

    pub fn to_record(&self) -> ErrorRecord {
        let (error_code, error_trace) = match self {
            FacadeError::Broker { code, trace, .. } => (*code, trace.clone()),
            other => (0, source_chain(other)),
        };

        ErrorRecord {
            error_code,
            error_message: self.to_string(),
            error_trace,
        }
    }
}

fn source_chain(error: &dyn StdError) -> Vec<String> {
    let mut trace = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        trace.push(source.to_string());
        current = source.source();
    }
    trace
}

// Converting from lapin errors
impl From<LapinError> for FacadeError {
    fn from(error: LapinError) -> Self {
        let code = match &error {
            LapinError::ProtocolError(amqp_error) => amqp_error.get_id(),
            _ => 0,
        };

        let mut trace = vec![format!("{:?}", error)];
        trace.extend(source_chain(&error));

        FacadeError::Broker {
            code,
            message: error.to_string(),
            trace,
        }
    }
}

impl From<Elapsed> for FacadeError {
    fn from(_: Elapsed) -> Self {
        FacadeError::Timeout("Connection timed out".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_messages_match_keys() {
        assert_eq!(
            error_string(ErrorKey::FileNotFound),
            "File Do not exists. Please provide a valid file"
        );
        assert_eq!(
            error_string(ErrorKey::InvalidExchange),
            "Please provide a valid exchange name"
        );
    }

    #[test]
    fn error_keys_parse_from_their_names() {
        assert_eq!("file_not_found".parse::<ErrorKey>(), Ok(ErrorKey::FileNotFound));
        assert_eq!("invalid_exchange".parse::<ErrorKey>(), Ok(ErrorKey::InvalidExchange));
        assert_eq!(
            "no_such_key".parse::<ErrorKey>(),
            Err(UnknownErrorKey("no_such_key".to_string()))
        );
    }

    #[test]
    fn errors_are_classified() {
        let err = FacadeError::InvalidExchange("amq.weird".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidExchange);

        let err = FacadeError::FileNotFound(PathBuf::from("missing.png"));
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(err.to_string().starts_with(ErrorKey::FileNotFound.message()));

        let err = FacadeError::Timeout("Connection timed out".to_string());
        assert_eq!(err.kind(), ErrorKind::BrokerFailure);
    }

    #[test]
    fn broker_errors_keep_code_and_trace_in_record() {
        let err = FacadeError::Broker {
            code: 404,
            message: "NOT_FOUND - no queue 'q'".to_string(),
            trace: vec!["ProtocolError".to_string()],
        };

        let record = err.to_record();
        assert_eq!(record.error_code, 404);
        assert_eq!(record.error_message, "RabbitMQ broker error: NOT_FOUND - no queue 'q'");
        assert_eq!(record.error_trace, vec!["ProtocolError".to_string()]);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error_code"], 404);
        assert!(json.get("error_message").is_some());
        assert!(json.get("error_trace").is_some());
    }

    #[test]
    fn io_errors_record_zero_code() {
        let err = FacadeError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only directory",
        ));

        assert_eq!(err.kind(), ErrorKind::Storage);
        let record = err.to_record();
        assert_eq!(record.error_code, 0);
        assert_eq!(record.error_message, "File storage error: read-only directory");
    }
}

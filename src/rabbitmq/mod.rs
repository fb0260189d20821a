// src/rabbitmq/mod.rs
// RabbitMQ facade: connection handling, declarations, publish/consume

pub mod amqp_client;
pub mod connection;
pub mod consumer;
pub mod errors;
pub mod exchange;
mod facade;

// Re-export specific items to simplify imports elsewhere
pub use amqp_client::{Broker, DeliveryStream, LapinBroker};
pub use connection::ConnectionParams;
pub use consumer::MessageStream;
pub use errors::{error_string, ErrorKey, ErrorKind, ErrorRecord, FacadeError, Result};
pub use exchange::{ConsumeOptions, ExchangeKind, ExchangeOptions, QueueOptions};
pub use facade::Facade;

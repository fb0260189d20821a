//! A thin facade over `lapin`: one connection/channel pair, queue and
//! exchange declaration, JSON publish/consume, and files carried inside
//! JSON message bodies.

pub mod config;
pub mod env;
pub mod file_transfer;
pub mod logging;
pub mod message;
pub mod rabbitmq;

pub use message::Incoming;
pub use rabbitmq::{
    ConnectionParams, ConsumeOptions, ErrorKind, ExchangeKind, ExchangeOptions, Facade,
    FacadeError, QueueOptions,
};

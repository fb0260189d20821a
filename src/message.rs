use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::file_transfer;
use crate::rabbitmq::errors::Result;

/// A delivered message, detached from the client library's delivery type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incoming {
    pub delivery_tag: u64,
    pub exchange: String,
    pub routing_key: String,
    pub redelivered: bool,
    pub data: Vec<u8>,
}

impl Incoming {
    /// Body as text, lossy for invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Parses the body as JSON into `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.data)?)
    }

    /// True when the body is a JSON object carrying all file-transfer fields.
    pub fn carries_file(&self) -> bool {
        match serde_json::from_slice::<Value>(&self.data) {
            Ok(Value::Object(map)) => file_transfer::has_file_fields(&map),
            _ => false,
        }
    }
}

impl From<lapin::message::Delivery> for Incoming {
    fn from(delivery: lapin::message::Delivery) -> Self {
        Incoming {
            delivery_tag: delivery.delivery_tag,
            exchange: delivery.exchange.as_str().to_owned(),
            routing_key: delivery.routing_key.as_str().to_owned(),
            redelivered: delivery.redelivered,
            data: delivery.data,
        }
    }
}

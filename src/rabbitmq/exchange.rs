use super::errors::{FacadeError, Result};

/// Exchange names the facade accepts, compared case-insensitively.
pub const ALLOWED_EXCHANGE_NAMES: [&str; 4] = ["direct", "fanout", "topic", "headers"];

/// Exchange bound by [`Facade::non_durable_queue_bind`](super::Facade::non_durable_queue_bind).
pub const LOGS_EXCHANGE: &str = "logs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangeKind {
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
}

impl From<ExchangeKind> for lapin::ExchangeKind {
    fn from(kind: ExchangeKind) -> Self {
        match kind {
            ExchangeKind::Direct => lapin::ExchangeKind::Direct,
            ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
            ExchangeKind::Topic => lapin::ExchangeKind::Topic,
            ExchangeKind::Headers => lapin::ExchangeKind::Headers,
        }
    }
}

/// Returns the lower-cased exchange name, or `InvalidExchange` when it is not
/// one of [`ALLOWED_EXCHANGE_NAMES`].
pub fn validate_exchange_name(name: &str) -> Result<&'static str> {
    let lowered = name.to_lowercase();
    ALLOWED_EXCHANGE_NAMES
        .iter()
        .find(|allowed| **allowed == lowered)
        .copied()
        .ok_or_else(|| FacadeError::InvalidExchange(name.to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueOptions {
    pub passive: bool,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
}

impl QueueOptions {
    pub fn durable(mut self) -> Self {
        self.durable = true;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn auto_delete(mut self) -> Self {
        self.auto_delete = true;
        self
    }
}

impl From<QueueOptions> for lapin::options::QueueDeclareOptions {
    fn from(options: QueueOptions) -> Self {
        lapin::options::QueueDeclareOptions {
            passive: options.passive,
            durable: options.durable,
            exclusive: options.exclusive,
            auto_delete: options.auto_delete,
            nowait: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeOptions {
    pub passive: bool,
    pub durable: bool,
    pub auto_delete: bool,
}

impl ExchangeOptions {
    pub fn durable(mut self) -> Self {
        self.durable = true;
        self
    }
}

impl From<ExchangeOptions> for lapin::options::ExchangeDeclareOptions {
    fn from(options: ExchangeOptions) -> Self {
        lapin::options::ExchangeDeclareOptions {
            passive: options.passive,
            durable: options.durable,
            auto_delete: options.auto_delete,
            internal: false,
            nowait: false,
        }
    }
}

/// Consumer registration flags. `no_ack` defaults to `true`: deliveries are
/// considered acknowledged as soon as the broker sends them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeOptions {
    /// Empty means a `consumer-<uuid>` tag is generated.
    pub consumer_tag: String,
    pub no_local: bool,
    pub no_ack: bool,
    pub exclusive: bool,
    pub no_wait: bool,
}

impl Default for ConsumeOptions {
    fn default() -> Self {
        Self {
            consumer_tag: String::new(),
            no_local: false,
            no_ack: true,
            exclusive: false,
            no_wait: false,
        }
    }
}

impl ConsumeOptions {
    pub fn tag(mut self, consumer_tag: &str) -> Self {
        self.consumer_tag = consumer_tag.to_string();
        self
    }

    pub fn manual_ack(mut self) -> Self {
        self.no_ack = false;
        self
    }
}

impl From<&ConsumeOptions> for lapin::options::BasicConsumeOptions {
    fn from(options: &ConsumeOptions) -> Self {
        lapin::options::BasicConsumeOptions {
            no_local: options.no_local,
            no_ack: options.no_ack,
            exclusive: options.exclusive,
            nowait: options.no_wait,
        }
    }
}

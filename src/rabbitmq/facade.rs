use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::amqp_client::{Broker, LapinBroker};
use super::connection::ConnectionParams;
use super::consumer::MessageStream;
use super::errors::Result;
use super::exchange::{
    validate_exchange_name, ConsumeOptions, ExchangeKind, ExchangeOptions, QueueOptions,
    LOGS_EXCHANGE,
};
use crate::file_transfer;
use crate::message::Incoming;

static SHARED: OnceCell<Arc<Facade<LapinBroker>>> = OnceCell::const_new();

/// One connection/channel pair and the operations built on it.
pub struct Facade<B: Broker = LapinBroker> {
    broker: B,
    params: ConnectionParams,
}

impl Facade<LapinBroker> {
    /// Opens a dedicated connection.
    pub async fn connect(params: ConnectionParams) -> Result<Self> {
        let broker = LapinBroker::connect(&params).await?;
        Ok(Self::with_broker(broker, params))
    }

    /// Process-wide instance. The first successful call connects; later calls
    /// return the same instance and ignore their arguments.
    pub async fn instance(params: ConnectionParams) -> Result<Arc<Self>> {
        shared_instance(&SHARED, params, Self::connect).await
    }
}

pub(crate) async fn shared_instance<B, F, Fut>(
    cell: &OnceCell<Arc<Facade<B>>>,
    params: ConnectionParams,
    connect: F,
) -> Result<Arc<Facade<B>>>
where
    B: Broker,
    F: FnOnce(ConnectionParams) -> Fut,
    Fut: Future<Output = Result<Facade<B>>>,
{
    let requested = params.clone();
    let facade = cell
        .get_or_try_init(|| async move { connect(params).await.map(Arc::new) })
        .await?;

    if facade.params() != &requested {
        warn!(
            "Shared RabbitMQ facade already connected to {}; ignoring parameters for {}",
            facade.params().address(),
            requested.address()
        );
    }
    Ok(Arc::clone(facade))
}

impl<B: Broker> Facade<B> {
    pub fn with_broker(broker: B, params: ConnectionParams) -> Self {
        Self { broker, params }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<String> {
        self.broker.declare_queue(name, options).await
    }

    /// Declares one of the allowed exchanges under its lower-cased name.
    /// Unknown names fail before anything is sent to the broker.
    pub async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<()> {
        let name = validate_exchange_name(name).inspect_err(|err| warn!("{}", err))?;
        self.broker.declare_exchange(name, kind, options).await
    }

    pub async fn publish<T: Serialize + ?Sized>(
        &self,
        message: &T,
        exchange: &str,
        routing_key: &str,
    ) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        self.broker
            .publish(exchange, routing_key, &payload)
            .await
            .inspect_err(|err| error!("Failed to publish message: {}", err))
    }

    /// Registers a consumer on `queue`. A `consumer-<uuid>` tag is used when
    /// none is given.
    pub async fn consume(
        &self,
        queue: &str,
        options: ConsumeOptions,
        cancel: CancellationToken,
    ) -> Result<MessageStream> {
        let mut options = options;
        if options.consumer_tag.is_empty() {
            options.consumer_tag = format!("consumer-{}", Uuid::new_v4());
        }

        let deliveries = self.broker.consume(queue, &options).await?;
        Ok(MessageStream::new(deliveries, cancel))
    }

    /// Runs `callback` for every delivery until the consumer closes or `cancel`
    /// fires. A delivery error ends the loop and is returned.
    pub async fn consume_with<F, Fut>(
        &self,
        queue: &str,
        options: ConsumeOptions,
        cancel: CancellationToken,
        mut callback: F,
    ) -> Result<()>
    where
        F: FnMut(Incoming) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut messages = self
            .consume(queue, options, cancel)
            .await
            .inspect_err(|err| error!("Failed to register consumer on '{}': {}", queue, err))?;

        info!(" [*] Waiting for messages on '{}'", queue);
        while let Some(delivery) = messages.next().await {
            let incoming = delivery.inspect_err(|err| error!("Error receiving message: {}", err))?;
            callback(incoming).await;
        }

        info!("Stopped consuming from '{}'", queue);
        Ok(())
    }

    pub async fn ack(&self, incoming: &Incoming) -> Result<()> {
        self.broker.ack(incoming.delivery_tag).await
    }

    /// Declares a broker-named queue, binds it to the `logs` exchange and
    /// returns its name.
    pub async fn non_durable_queue_bind(&self, options: QueueOptions) -> Result<String> {
        let queue = self.broker.declare_queue("", options).await?;
        self.broker.bind_queue(&queue, LOGS_EXCHANGE, "").await?;
        Ok(queue)
    }

    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        data: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        file_transfer::send_file(path, data).await
    }

    pub async fn publish_file(
        &self,
        path: impl AsRef<Path>,
        data: Map<String, Value>,
        exchange: &str,
        routing_key: &str,
    ) -> Result<()> {
        let payload = self.send_file(path, data).await?;
        self.publish(&payload, exchange, routing_key).await
    }

    pub async fn store_file_return_message(
        &self,
        storage_dir: impl AsRef<Path>,
        message: &[u8],
    ) -> Result<Value> {
        file_transfer::store_file_return_message(storage_dir, message).await
    }

    pub async fn close(&self) -> Result<()> {
        self.broker.close().await
    }
}

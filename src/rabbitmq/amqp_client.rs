// src/rabbitmq/amqp_client.rs

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicPublishOptions, QueueBindOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::connection::{self, ConnectionParams};
use super::errors::{FacadeError, Result};
use super::exchange::{ConsumeOptions, ExchangeKind, ExchangeOptions, QueueOptions};
use crate::message::Incoming;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Deliveries from a registered consumer.
pub type DeliveryStream = BoxStream<'static, Result<Incoming>>;

/// Broker operations the facade relies on.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Declares a queue and returns its name, which the broker picks when
    /// `name` is empty.
    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<String>;

    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<()>;

    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str) -> Result<()>;

    /// Publishes a JSON body.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<()>;

    async fn consume(&self, queue: &str, options: &ConsumeOptions) -> Result<DeliveryStream>;

    async fn ack(&self, delivery_tag: u64) -> Result<()>;

    /// Closes the channel, then the connection.
    async fn close(&self) -> Result<()>;
}

/// [`Broker`] backed by one lapin connection and channel.
pub struct LapinBroker {
    connection: Connection,
    channel: Channel,
}

impl LapinBroker {
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let (connection, channel) = connection::open(params).await?;
        Ok(Self { connection, channel })
    }
}

#[async_trait]
impl Broker for LapinBroker {
    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<String> {
        let queue = self
            .channel
            .queue_declare(name, options.into(), FieldTable::default())
            .await?;

        info!(
            "Queue '{}' declared with {} messages",
            queue.name().as_str(),
            queue.message_count()
        );
        Ok(queue.name().as_str().to_owned())
    }

    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<()> {
        self.channel
            .exchange_declare(name, kind.into(), options.into(), FieldTable::default())
            .await?;

        info!("Exchange '{}' declared as {:?}", name, kind);
        Ok(())
    }

    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str) -> Result<()> {
        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!("Queue '{}' bound to exchange '{}'", queue, exchange);
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<()> {
        let properties = BasicProperties::default()
            .with_message_id(Uuid::new_v4().to_string().into())
            .with_content_type(JSON_CONTENT_TYPE.into())
            .with_timestamp(chrono::Utc::now().timestamp() as u64);

        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await?;

        debug!(
            "Published {} bytes to exchange '{}' with routing key '{}'",
            payload.len(),
            exchange,
            routing_key
        );
        Ok(())
    }

    async fn consume(&self, queue: &str, options: &ConsumeOptions) -> Result<DeliveryStream> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &options.consumer_tag,
                options.into(),
                FieldTable::default(),
            )
            .await?;

        info!("Started consuming from queue: {}", queue);
        Ok(consumer
            .map(|delivery| delivery.map(Incoming::from).map_err(FacadeError::from))
            .boxed())
    }

    async fn ack(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        info!("Closing RabbitMQ channel and connection");
        self.channel.close(200, "Closing channel").await?;
        self.connection.close(200, "Closing connection").await?;
        Ok(())
    }
}

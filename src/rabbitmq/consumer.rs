use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::amqp_client::DeliveryStream;
use super::errors::Result;
use crate::message::Incoming;

/// Deliveries from one consumer. Ends when the broker closes the consumer or
/// the cancellation token fires, whichever comes first.
pub struct MessageStream {
    inner: DeliveryStream,
    cancel: CancellationToken,
}

impl MessageStream {
    pub fn new(deliveries: DeliveryStream, cancel: CancellationToken) -> Self {
        let inner = deliveries.take_until(cancel.clone().cancelled_owned()).boxed();
        Self { inner, cancel }
    }

    /// Stops the stream; pending deliveries are not yielded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for MessageStream {
    type Item = Result<Incoming>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn incoming(tag: u64) -> Incoming {
        Incoming {
            delivery_tag: tag,
            exchange: String::new(),
            routing_key: "jobs".to_string(),
            redelivered: false,
            data: format!("{{\"n\":{}}}", tag).into_bytes(),
        }
    }

    #[tokio::test]
    async fn yields_until_inner_stream_ends() {
        let deliveries = stream::iter(vec![Ok(incoming(1)), Ok(incoming(2))]).boxed();
        let messages: Vec<_> = MessageStream::new(deliveries, CancellationToken::new())
            .collect()
            .await;

        let tags: Vec<u64> = messages
            .into_iter()
            .map(|message| message.unwrap().delivery_tag)
            .collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[tokio::test]
    async fn cancellation_ends_an_open_stream() {
        let deliveries = stream::iter(vec![Ok(incoming(1)), Ok(incoming(2))])
            .chain(stream::pending())
            .boxed();
        let mut messages = MessageStream::new(deliveries, CancellationToken::new());

        let first = messages.next().await.unwrap().unwrap();
        assert_eq!(first.delivery_tag, 1);

        messages.cancel();
        assert!(messages.is_cancelled());
        assert!(messages.next().await.is_none());
    }

    #[tokio::test]
    async fn already_cancelled_token_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let deliveries = stream::iter(vec![Ok(incoming(1))]).boxed();
        let mut messages = MessageStream::new(deliveries, cancel);
        assert!(messages.next().await.is_none());
    }
}

// These tests need a running RabbitMQ broker reachable with the RABBITMQ_*
// environment variables (defaults: localhost:5672, admin/admin).
// Run with `cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rabbit_facade::{
    env, ConnectionParams, ConsumeOptions, ErrorKind, ExchangeKind, ExchangeOptions, Facade,
    QueueOptions,
};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn params() -> ConnectionParams {
    env::load().expect("Failed to load RabbitMQ settings").connection.params()
}

#[tokio::test]
#[ignore] // Requires a running RabbitMQ instance
async fn publish_then_consume_on_the_default_exchange() {
    let facade = Facade::connect(params()).await.unwrap();
    let queue = format!("test_queue_{}", Uuid::new_v4());
    facade
        .declare_queue(&queue, QueueOptions::default().auto_delete())
        .await
        .unwrap();

    facade
        .publish(&json!({"greeting": "hello"}), "", &queue)
        .await
        .unwrap();

    let mut messages = facade
        .consume(&queue, ConsumeOptions::default(), CancellationToken::new())
        .await
        .unwrap();
    let received = tokio::time::timeout(Duration::from_secs(5), messages.next())
        .await
        .expect("no message within 5s")
        .unwrap()
        .unwrap();

    assert_eq!(received.payload::<Value>().unwrap(), json!({"greeting": "hello"}));
    messages.cancel();
    facade.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires a running RabbitMQ instance
async fn file_travels_through_the_broker() {
    let facade = Facade::connect(params()).await.unwrap();
    let outbox = tempfile::tempdir().unwrap();
    let inbox = tempfile::tempdir().unwrap();
    let path = outbox.path().join("report.csv");
    std::fs::write(&path, b"id,total\n1,9.99\n").unwrap();

    let queue = facade
        .declare_queue("", QueueOptions::default().exclusive())
        .await
        .unwrap();
    facade
        .publish_file(&path, Map::new(), "", &queue)
        .await
        .unwrap();

    let mut messages = facade
        .consume(&queue, ConsumeOptions::default(), CancellationToken::new())
        .await
        .unwrap();
    let delivery = tokio::time::timeout(Duration::from_secs(5), messages.next())
        .await
        .expect("no message within 5s")
        .unwrap()
        .unwrap();

    let stored = facade
        .store_file_return_message(inbox.path(), &delivery.data)
        .await
        .unwrap();
    let stored_name = stored["fileName"].as_str().unwrap();
    assert_eq!(
        std::fs::read(inbox.path().join(stored_name)).unwrap(),
        b"id,total\n1,9.99\n"
    );
    facade.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires a running RabbitMQ instance
async fn exchange_names_are_validated_before_declaring() {
    let facade = Facade::connect(params()).await.unwrap();

    let err = facade
        .declare_exchange("logs", ExchangeKind::Fanout, ExchangeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidExchange);

    facade
        .declare_exchange("FANOUT", ExchangeKind::Fanout, ExchangeOptions::default())
        .await
        .unwrap();
    facade.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires a running RabbitMQ instance
async fn shared_instance_is_reused() {
    let first = Facade::instance(params()).await.unwrap();
    let second = Facade::instance(ConnectionParams::new("elsewhere", 1, "x", "y"))
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn unreachable_broker_is_a_broker_failure() {
    let params = ConnectionParams::new("127.0.0.1", 1, "guest", "guest")
        .with_connect_timeout(Duration::from_secs(2));

    let err = match Facade::connect(params).await {
        Ok(_) => panic!("connected to a closed port"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::BrokerFailure);
}

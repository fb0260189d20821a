// Each file in the tests directory is its own crate; these run without a broker.

use rabbit_facade::file_transfer::{
    send_file, store_file_return_message, FILE_DATA, FILE_EXTENSION, FILE_NAME,
};
use rabbit_facade::{ErrorKind, FacadeError};
use serde_json::{json, Map, Value};

fn caption(text: &str) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("caption".to_string(), json!(text));
    data
}

#[tokio::test]
async fn file_round_trips_through_a_message_body() {
    let outbox = tempfile::tempdir().unwrap();
    let inbox = tempfile::tempdir().unwrap();
    let original: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    let path = outbox.path().join("photo.png");
    std::fs::write(&path, &original).unwrap();

    let payload = send_file(&path, caption("hi")).await.unwrap();
    let body = serde_json::to_vec(&payload).unwrap();

    let stored = store_file_return_message(inbox.path(), &body).await.unwrap();

    assert_eq!(stored["caption"], "hi");
    assert!(stored.get(FILE_EXTENSION).is_none());
    assert!(stored.get(FILE_DATA).is_none());

    let stored_name = stored[FILE_NAME].as_str().unwrap();
    assert_ne!(stored_name, "photo.png");
    assert!(stored_name.ends_with(".png"));
    assert_eq!(std::fs::read(inbox.path().join(stored_name)).unwrap(), original);
}

#[tokio::test]
async fn same_file_received_twice_gets_two_names() {
    let outbox = tempfile::tempdir().unwrap();
    let inbox = tempfile::tempdir().unwrap();
    let path = outbox.path().join("notes.txt");
    std::fs::write(&path, b"twice").unwrap();

    let body = serde_json::to_vec(&send_file(&path, Map::new()).await.unwrap()).unwrap();
    let first = store_file_return_message(inbox.path(), &body).await.unwrap();
    let second = store_file_return_message(inbox.path(), &body).await.unwrap();

    assert_ne!(first[FILE_NAME], second[FILE_NAME]);
    assert_eq!(std::fs::read_dir(inbox.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn empty_file_round_trips() {
    let outbox = tempfile::tempdir().unwrap();
    let inbox = tempfile::tempdir().unwrap();
    let path = outbox.path().join("empty.log");
    std::fs::write(&path, b"").unwrap();

    let payload = send_file(&path, Map::new()).await.unwrap();
    assert_eq!(payload[FILE_DATA], "");

    let stored = store_file_return_message(inbox.path(), &serde_json::to_vec(&payload).unwrap())
        .await
        .unwrap();
    let stored_name = stored[FILE_NAME].as_str().unwrap();
    assert!(std::fs::read(inbox.path().join(stored_name)).unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_reports_catalog_error() {
    let outbox = tempfile::tempdir().unwrap();
    let missing = outbox.path().join("gone.pdf");

    let err = send_file(&missing, caption("hi")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FileNotFound);
    assert!(matches!(err, FacadeError::FileNotFound(ref path) if path == &missing));
    let record = err.to_record();
    assert_eq!(record.error_code, 0);
    assert!(record
        .error_message
        .starts_with("File Do not exists. Please provide a valid file"));
}

#[tokio::test]
async fn ordinary_messages_pass_through() {
    let inbox = tempfile::tempdir().unwrap();
    let message = json!({"order_id": 12, "fileName": "only-a-name.txt"});

    let stored = store_file_return_message(inbox.path(), message.to_string().as_bytes())
        .await
        .unwrap();

    assert_eq!(stored, message);
    assert_eq!(std::fs::read_dir(inbox.path()).unwrap().count(), 0);
}

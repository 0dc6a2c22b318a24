//! Error Sink Drain Tests

mod common;

use std::sync::Arc;

use lq_store::{MemoryStore, Store};
use lq_worker::ErrorSink;

use common::*;

#[tokio::test]
async fn test_drain_emits_each_message_once_and_closes() {
    let store = Arc::new(MemoryStore::new());
    for message in ["e1", "e2", "e3"] {
        store.push_tail(ERROR_QUEUE, message).await.unwrap();
    }
    store.push_tail(QUEUE, "untouched").await.unwrap();

    let sink = ErrorSink::new(store.clone(), ERROR_QUEUE.to_string());
    let mut emitted = Vec::new();
    let drained = sink.drain(|m| emitted.push(m.to_string())).await.unwrap();

    assert_eq!(drained, 3);
    assert_eq!(emitted, vec!["e1", "e2", "e3"]);
    assert!(store.is_closed());
    assert!(store.list(ERROR_QUEUE).is_empty());
    assert_eq!(store.list(QUEUE), vec!["untouched".to_string()]);
}

#[tokio::test]
async fn test_drain_empty_list_closes_immediately() {
    let store = Arc::new(MemoryStore::new());
    let sink = ErrorSink::new(store.clone(), ERROR_QUEUE.to_string());

    let drained = sink.drain(|m| panic!("unexpected message {}", m)).await.unwrap();

    assert_eq!(drained, 0);
    assert!(store.is_closed());
}

#[tokio::test]
async fn test_drain_on_closed_store_fails() {
    let store = Arc::new(MemoryStore::new());
    store.close().await;
    let sink = ErrorSink::new(store.clone(), ERROR_QUEUE.to_string());

    assert!(sink.drain(|_| {}).await.is_err());
}

//! Instance Runner Tests
//!
//! Tests for:
//! - Cooperative stop and connection close
//! - Fatal errors ending the run
//! - Two consumers racing for an absent lease
//! - Failover after the generator's lease lapses

mod common;

use std::sync::Arc;
use std::time::Duration;

use lq_store::{MemoryStore, Store};
use lq_worker::{Instance, Role, SimulatedProcessor};

use common::*;

fn instance(store: Arc<dyn Store>, id: &str, role: Role) -> Instance {
    Instance::new(
        worker_config(id),
        store,
        Arc::new(ScriptedProcessor::succeeding()),
        role,
    )
}

#[tokio::test]
async fn test_stop_before_run_closes_without_work() {
    let store = Arc::new(MemoryStore::new());
    let instance = instance(store.clone(), "gen", Role::Generator);
    instance.stop_handle().stop();

    instance.run().await.unwrap();

    assert!(store.is_closed());
    assert!(store.list(QUEUE).is_empty());
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_run_closes_connection() {
    let store = Arc::new(MemoryStore::new());
    let instance = instance(store.clone(), "gen", Role::Generator);
    let stop = instance.stop_handle();

    let handle = tokio::spawn(instance.run());
    tokio::time::sleep(Duration::from_millis(2200)).await;
    stop.stop();

    handle.await.unwrap().unwrap();

    assert!(store.is_closed());
    // Steps at 0, 500, 1000, 1500, 2000 ms
    assert_eq!(store.list(QUEUE).len(), 5);
}

#[tokio::test]
async fn test_fatal_error_ends_run_and_closes_store() {
    let store = Arc::new(FaultyStore::failing_commits());
    let instance = instance(store.clone(), "gen", Role::Generator);

    let result = instance.run().await;

    assert!(result.is_err());
    assert!(store.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_consumers_race_for_absent_lease() {
    let store = Arc::new(MemoryStore::new());
    store.push_tail(QUEUE, "m1").await.unwrap();

    let spawn_first_step = |mut instance: Instance| {
        tokio::spawn(async move {
            instance.step().await.unwrap();
            instance
        })
    };

    let a = spawn_first_step(instance(store.clone(), "node-a", Role::Consumer));
    let b = spawn_first_step(instance(store.clone(), "node-b", Role::Consumer));
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let roles = [a.role(), b.role()];
    assert_eq!(roles.iter().filter(|r| **r == Role::Generator).count(), 1);

    let (generator, mut consumer) = if a.role() == Role::Generator { (a, b) } else { (b, a) };
    assert_eq!(store.value(LEASE_KEY).as_deref(), Some(generator.instance_id()));

    // The loser keeps consuming
    consumer.step().await.unwrap();
    assert_eq!(consumer.role(), Role::Consumer);
    assert!(store.list(QUEUE).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_consumer_takes_over_after_lease_lapses() {
    let store = Arc::new(MemoryStore::new());
    hold_lease(&*store, "departed-generator").await;

    let instance = Instance::new(
        worker_config("standby"),
        store.clone(),
        Arc::new(SimulatedProcessor::new(0)),
        Role::Consumer,
    );
    let stop = instance.stop_handle();
    let handle = tokio::spawn(instance.run());

    // Startup check defers; empty pops back off 1s each
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.value(LEASE_KEY).as_deref(), Some("departed-generator"));
    assert!(store.list(QUEUE).is_empty());

    // Lease lapses at 10s; the next check (after ten more empty pops) claims it
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(store.value(LEASE_KEY).as_deref(), Some("standby"));
    assert!(!store.list(QUEUE).is_empty());

    stop.stop();
    handle.await.unwrap().unwrap();
    assert!(store.is_closed());
}

//! Concurrency limiter tests

use cf_support::limiter::ConcurrencyLimiter;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_capacity_is_never_exceeded() {
    let limiter = ConcurrencyLimiter::new(3);
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);

    let tasks = (0..12).map(|_| {
        limiter.run("Pods", async {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            done.fetch_add(1, Ordering::SeqCst);
        })
    });

    let results = join_all(tasks).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(done.load(Ordering::SeqCst), 12);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_pools_are_independent() {
    let limiter = ConcurrencyLimiter::new(1);
    let _pods = limiter.acquire("Pods").await.unwrap();

    assert_eq!(limiter.available("Pods"), 0);
    assert_eq!(limiter.available("Nodes"), 1);

    let nodes = tokio::time::timeout(Duration::from_millis(100), limiter.acquire("Nodes")).await;
    assert!(nodes.is_ok());
}

#[tokio::test]
async fn test_release_unblocks_waiter() {
    let limiter = Arc::new(ConcurrencyLimiter::new(1));
    let held = limiter.acquire("Events").await.unwrap();

    let waiter = {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.acquire("Events").await.map(|p| p.pool().to_string()) })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    held.release();
    let pool = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter was not unblocked")
        .unwrap()
        .unwrap();
    assert_eq!(pool, "Events");
}

#[tokio::test]
async fn test_failed_operation_returns_slot() {
    let limiter = ConcurrencyLimiter::new(2);

    let result: Result<Result<(), &str>, _> = limiter.run("Jobs", async { Err("boom") }).await;
    assert_eq!(result.unwrap(), Err("boom"));
    assert_eq!(limiter.available("Jobs"), 2);
}

#[tokio::test]
async fn test_panicking_holder_returns_slot() {
    let limiter = Arc::new(ConcurrencyLimiter::new(1));

    let task = {
        let limiter = limiter.clone();
        tokio::spawn(async move {
            let _permit = limiter.acquire("Nodes").await.unwrap();
            panic!("holder failed");
        })
    };
    assert!(task.await.is_err());

    assert_eq!(limiter.available("Nodes"), 1);
}

#[test]
fn test_zero_capacity_is_one() {
    assert_eq!(ConcurrencyLimiter::new(0).capacity(), 1);
    assert_eq!(ConcurrencyLimiter::default().capacity(), 5);
}

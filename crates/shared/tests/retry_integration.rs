//! 重试执行器集成测试

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use board_shared::retry::{RetryPolicy, retry_with_policy};

#[derive(Debug)]
enum StoreError {
    Unavailable,
    Conflict,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => f.write_str("unavailable"),
            Self::Conflict => f.write_str("conflict"),
        }
    }
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        multiplier: 2.0,
    }
}

fn transient(e: &StoreError) -> bool {
    matches!(e, StoreError::Unavailable)
}

#[tokio::test]
async fn test_transient_failures_recover() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result = retry_with_policy(&fast_policy(3), "award", transient, || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Unavailable)
            } else {
                Ok(42)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), StoreError> =
        retry_with_policy(&fast_policy(3), "award", transient, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Conflict) }
        })
        .await;

    assert!(matches!(result, Err(StoreError::Conflict)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), StoreError> =
        retry_with_policy(&fast_policy(2), "sync_count", transient, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Unavailable) }
        })
        .await;

    assert!(matches!(result, Err(StoreError::Unavailable)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_policy_none_runs_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), StoreError> =
        retry_with_policy(&RetryPolicy::none(), "evaluate", transient, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Unavailable) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

//! Cross-module composition: retry-wrapped operations feeding lazy result
//! collections, polled to completion.

use holdfast::{
    check_until, InstantSleeper, Poller, ResponseInfo, ResponseList, RetryPolicy,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProbeError(&'static str);

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "probe error: {}", self.0)
    }
}

impl std::error::Error for ProbeError {}

#[tokio::test]
async fn retried_fetch_lands_in_a_response_list() {
    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();

    let policy = RetryPolicy::builder()
        .max_retries(3)
        .retry_if(|e: &ProbeError| e.0 == "connection reset")
        .with_sleeper(InstantSleeper)
        .build()
        .expect("valid policy");

    // The fetch fails twice before producing a lazy cell.
    let info = policy
        .execute(|| {
            let attempts = attempts_clone.clone();
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProbeError("connection reset"))
                } else {
                    Ok(ResponseInfo::builder()
                        .description("status probe")
                        .extra("region", json!("us-east"))
                        .callback(|| Ok::<_, ProbeError>("ready".to_string()))
                        .build())
                }
            }
        })
        .await
        .expect("fetch succeeds within the retry budget");

    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    let mut list: ResponseList<String, ProbeError> = ResponseList::new();
    list.set_single(info);

    assert_eq!(list.single().expect("one element").description(), Some("status probe"));
    assert_eq!(list.field_values("region").unwrap(), vec![json!("us-east")]);

    // Nothing has run yet; bulk resolution forces the pending callback.
    assert!(list.single().unwrap().has_pending_callback());
    list.resolve_all().expect("callback succeeds");
    assert_eq!(list.single_mut().unwrap().data().unwrap().unwrap(), "ready");
    assert_eq!(list.field_values("response").unwrap(), vec![json!("ready")]);
}

#[tokio::test]
async fn retry_policy_may_rearm_a_failed_lazy_callback() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let invocations_clone = invocations.clone();

    // Fails twice, then produces a value. A failed run leaves the callback
    // armed, so an outer retry policy can drive it to completion.
    let cell = Arc::new(Mutex::new(ResponseInfo::<String, ProbeError>::from_callback(
        move || {
            if invocations_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProbeError("not ready"))
            } else {
                Ok("finally".to_string())
            }
        },
    )));

    let policy = RetryPolicy::builder()
        .max_retries(3)
        .retry_if(|_: &ProbeError| true)
        .with_sleeper(InstantSleeper)
        .build()
        .expect("valid policy");

    let cell_clone = cell.clone();
    policy
        .execute(|| {
            let cell = cell_clone.clone();
            async move { cell.lock().unwrap().resolve() }
        })
        .await
        .expect("resolution succeeds within the retry budget");

    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    let mut cell = cell.lock().unwrap();
    assert!(!cell.has_pending_callback());
    assert_eq!(cell.data().unwrap().unwrap(), "finally");
}

#[tokio::test]
async fn polling_resolves_a_list_one_cell_per_cycle() {
    let count = 3;
    let mut list: ResponseList<String, ProbeError> = ResponseList::new();
    list.extend((0..count).map(|i| {
        ResponseInfo::from_callback(move || Ok::<_, ProbeError>(format!("ready-{}", i)))
    }));
    let list = Arc::new(Mutex::new(list));

    let poller =
        Poller::new(Duration::from_secs(5), Duration::from_millis(10)).with_sleeper(InstantSleeper);

    let list_clone = list.clone();
    let resolved = poller
        .check_until(
            || {
                let list = list_clone.clone();
                async move {
                    let mut list = list.lock().unwrap();
                    if let Some(cell) = list.iter_mut().find(|c| c.has_pending_callback()) {
                        cell.resolve()?;
                    }
                    Ok::<_, ProbeError>(
                        list.iter().filter(|c| !c.has_pending_callback()).count(),
                    )
                }
            },
            |resolved| *resolved == count,
        )
        .await
        .expect("every cell resolves before the deadline");

    assert_eq!(resolved, count);

    let list = list.lock().unwrap();
    let values = list.field_values("response").unwrap();
    assert_eq!(values, vec![json!("ready-0"), json!("ready-1"), json!("ready-2")]);
}

#[tokio::test]
async fn poller_sees_clean_readings_through_a_retry_wrapper() {
    let reads = Arc::new(AtomicUsize::new(0));

    // Every other raw read fails transiently; the retry wrapper absorbs
    // those so the poller only ever observes successful readings.
    let policy = Arc::new(
        RetryPolicy::builder()
            .max_retries(2)
            .retry_if(|e: &ProbeError| e.0 == "transient")
            .with_sleeper(InstantSleeper)
            .build()
            .expect("valid policy"),
    );

    let poller =
        Poller::new(Duration::from_secs(5), Duration::from_millis(10)).with_sleeper(InstantSleeper);

    let reads_clone = reads.clone();
    let result = poller
        .check_until(
            move || {
                let policy = policy.clone();
                let reads = reads_clone.clone();
                async move {
                    policy
                        .execute(|| {
                            let reads = reads.clone();
                            async move {
                                let n = reads.fetch_add(1, Ordering::SeqCst);
                                if n % 2 == 0 {
                                    Err(ProbeError("transient"))
                                } else {
                                    Ok(n)
                                }
                            }
                        })
                        .await
                }
            },
            |n| *n >= 5,
        )
        .await
        .expect("a high enough reading arrives before the deadline");

    assert_eq!(result, 5);
    assert_eq!(reads.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn free_function_polls_a_shared_counter() {
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_clone = polls.clone();

    let result = check_until(
        || {
            let polls = polls_clone.clone();
            async move { Ok::<_, ProbeError>(polls.fetch_add(1, Ordering::SeqCst) + 1) }
        },
        |count| *count >= 3,
        Duration::from_secs(2),
        Duration::from_millis(10),
    )
    .await
    .expect("counter reaches the threshold");

    assert_eq!(result, 3);
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

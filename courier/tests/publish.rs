//! Notification fan-out through the full facade.

mod common;

use common::{Broadcast, CancelAwareSubscriber, OrderPlaced};
use courier::{
    CancellationToken, ErrorKind, FanOut, Publisher, Registry,
    testing::{CallLog, CountingSubscriber, FailingSubscriber},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

fn publisher(log: &CallLog) -> Publisher<Registry> {
    let first = CountingSubscriber::new("first").with_log(log.clone());
    let broken = FailingSubscriber::new("broken").with_log(log.clone());
    let last = CountingSubscriber::new("last").with_log(log.clone());
    let registry = Registry::builder()
        .subscriber_named::<OrderPlaced, _>("first", first)
        .subscriber_named::<OrderPlaced, _>("broken", broken)
        .subscriber_named::<OrderPlaced, _>("last", last)
        .build()
        .unwrap();
    Publisher::new(registry)
}

#[tokio::test]
async fn test_no_subscribers_succeeds_for_every_strategy() {
    let publisher = Publisher::new(Registry::default());
    for strategy in [
        FanOut::Sequential,
        FanOut::FailFast,
        FanOut::Parallel,
        FanOut::FireAndForget,
    ] {
        let outcome = publisher
            .publish(
                OrderPlaced { id: 1 },
                Some(strategy),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(outcome.is_success(), "{strategy} should succeed");
    }
}

#[tokio::test]
async fn test_sequential_reaches_everyone_and_reports_one_failure() {
    let log = CallLog::new();
    let outcome = publisher(&log)
        .publish(
            OrderPlaced { id: 1 },
            Some(FanOut::Sequential),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(log.entries(), vec!["first", "broken", "last"]);
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::Aggregate);
    let aggregate = error.as_aggregate().unwrap();
    assert_eq!(aggregate.attempted(), 3);
    assert_eq!(aggregate.subscribers().collect::<Vec<_>>(), vec!["broken"]);
}

#[tokio::test]
async fn test_fail_fast_stops_at_the_first_failure() {
    let log = CallLog::new();
    let outcome = publisher(&log)
        .publish(
            OrderPlaced { id: 1 },
            Some(FanOut::FailFast),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Subscriber));
    assert_eq!(
        outcome.error().unwrap().to_string(),
        "subscriber `broken` failed: broken"
    );
    assert_eq!(log.entries(), vec!["first", "broken"]);
}

#[tokio::test]
async fn test_parallel_aggregates_every_failure() {
    let registry = Registry::builder()
        .subscriber_named::<OrderPlaced, _>("a", FailingSubscriber::new("a failed"))
        .subscriber_named::<OrderPlaced, _>("b", CountingSubscriber::new("b"))
        .subscriber_named::<OrderPlaced, _>("c", FailingSubscriber::new("c failed"))
        .build()
        .unwrap();

    let outcome = Publisher::new(registry)
        .publish(
            OrderPlaced { id: 1 },
            Some(FanOut::Parallel),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let error = outcome.error().unwrap();
    let aggregate = error.as_aggregate().unwrap();
    assert_eq!(aggregate.len(), 2);
    assert_eq!(aggregate.subscribers().collect::<Vec<_>>(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_fire_and_forget_returns_before_subscribers_finish() {
    let slow = CountingSubscriber::new("slow").with_delay(Duration::from_millis(200));
    let registry = Registry::builder()
        .subscriber::<OrderPlaced, _>(slow.clone())
        .subscriber::<OrderPlaced, _>(FailingSubscriber::new("ignored"))
        .build()
        .unwrap();

    let started = Instant::now();
    let outcome = Publisher::new(registry)
        .publish(
            OrderPlaced { id: 1 },
            Some(FanOut::FireAndForget),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(started.elapsed() < Duration::from_millis(200));

    tokio::time::timeout(Duration::from_secs(5), async {
        while slow.count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_explicit_strategy_overrides_the_declared_one() {
    let log = CallLog::new();
    let broken = FailingSubscriber::new("broken").with_log(log.clone());
    let after = CountingSubscriber::new("after").with_log(log.clone());
    let registry = Registry::builder()
        .subscriber_named::<Broadcast, _>("broken", broken)
        .subscriber_named::<Broadcast, _>("after", after)
        .build()
        .unwrap();
    let publisher = Publisher::new(Arc::new(registry));

    assert_eq!(publisher.resolve_strategy::<Broadcast>(None), FanOut::Parallel);
    let outcome = publisher
        .publish(Broadcast, Some(FanOut::FailFast), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(log.entries(), vec!["broken"]);
}

#[tokio::test]
async fn test_cancellation_inside_a_subscriber_is_fatal() {
    let registry = Registry::builder()
        .subscriber::<OrderPlaced, _>(CancelAwareSubscriber)
        .build()
        .unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let fatal = Publisher::new(registry)
        .publish(OrderPlaced { id: 1 }, None, &token)
        .await
        .unwrap_err();

    assert!(fatal.is_canceled());
}

use super::{DeliveryStrategy, aggregate, invoke};
use courier_core::{Fatal, Notification, OperationContext, Outcome, SubscriberEntry};
use futures::future::join_all;
use std::sync::Arc;

/// A concurrent delivery strategy.
///
/// Starts every subscriber at once and waits for all of them. Failures are
/// collected into one aggregate; no ordering is guaranteed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelDelivery;

impl DeliveryStrategy for ParallelDelivery {
    async fn deliver<N: Notification>(
        &self,
        notification: Arc<N>,
        subscribers: Vec<SubscriberEntry<N>>,
        operation: &OperationContext,
    ) -> Result<Outcome, Fatal> {
        let results = join_all(
            subscribers
                .iter()
                .map(|entry| invoke(entry, &notification, operation)),
        )
        .await;

        let mut failures = Vec::new();
        for result in results {
            if let Err(failure) = result? {
                failures.push(failure);
            }
        }
        Ok(aggregate(subscribers.len(), failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FailingSubscriber;
    use courier_core::{BoxError, Message, Subscriber};
    use std::time::Duration;
    use tokio::sync::Barrier;

    struct Tick;
    impl Message for Tick {}
    impl Notification for Tick {}

    /// Completes only once every party has arrived.
    struct Rendezvous(Arc<Barrier>);

    impl Subscriber<Tick> for Rendezvous {
        async fn handle(&self, _: &Tick, _: &OperationContext) -> Result<(), BoxError> {
            self.0.wait().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_subscribers_run_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let subscribers = vec![
            SubscriberEntry::<Tick>::new("left", Arc::new(Rendezvous(Arc::clone(&barrier)))),
            SubscriberEntry::<Tick>::new("right", Arc::new(Rendezvous(barrier))),
        ];

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            ParallelDelivery.deliver(Arc::new(Tick), subscribers, &OperationContext::default()),
        )
        .await
        .expect("subscribers should not wait on each other")
        .unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_every_failure_is_aggregated() {
        let subscribers = vec![
            SubscriberEntry::<Tick>::new("a", Arc::new(FailingSubscriber::new("a failed"))),
            SubscriberEntry::<Tick>::new("b", Arc::new(FailingSubscriber::new("b failed"))),
        ];

        let outcome = ParallelDelivery
            .deliver(Arc::new(Tick), subscribers, &OperationContext::default())
            .await
            .unwrap();

        let aggregate = outcome.error().unwrap().as_aggregate().unwrap();
        assert_eq!(aggregate.len(), 2);
        let mut messages: Vec<_> = aggregate
            .failures()
            .iter()
            .map(|failure| failure.error().to_string())
            .collect();
        messages.sort();
        assert_eq!(messages, vec!["a failed", "b failed"]);
    }
}

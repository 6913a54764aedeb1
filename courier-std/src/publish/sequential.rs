use super::{DeliveryStrategy, aggregate, invoke};
use courier_core::{Fatal, Notification, OperationContext, Outcome, SubscriberEntry};
use std::sync::Arc;

/// A sequential delivery strategy.
///
/// Invokes subscribers one by one in registration order. A failing
/// subscriber does not stop the rest; every failure is collected into one
/// aggregate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialDelivery;

impl DeliveryStrategy for SequentialDelivery {
    async fn deliver<N: Notification>(
        &self,
        notification: Arc<N>,
        subscribers: Vec<SubscriberEntry<N>>,
        operation: &OperationContext,
    ) -> Result<Outcome, Fatal> {
        let mut failures = Vec::new();
        for entry in &subscribers {
            if let Err(failure) = invoke(entry, &notification, operation).await? {
                failures.push(failure);
            }
        }
        Ok(aggregate(subscribers.len(), failures))
    }
}

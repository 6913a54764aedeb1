use super::{DeliveryStrategy, invoke};
use courier_core::{
    CourierError, Fatal, Notification, OperationContext, Outcome, SubscriberEntry,
};
use std::sync::Arc;

/// A fail-fast delivery strategy.
///
/// Invokes subscribers one by one in registration order and stops at the
/// first failure, which becomes the result. Later subscribers never run.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFastDelivery;

impl DeliveryStrategy for FailFastDelivery {
    async fn deliver<N: Notification>(
        &self,
        notification: Arc<N>,
        subscribers: Vec<SubscriberEntry<N>>,
        operation: &OperationContext,
    ) -> Result<Outcome, Fatal> {
        for entry in &subscribers {
            if let Err(failure) = invoke(entry, &notification, operation).await? {
                return Ok(Outcome::failure(CourierError::Subscriber(failure)));
            }
        }
        Ok(Outcome::completed())
    }
}

//! Notification publishing.
//!
//! The [`Publisher`] resolves every subscriber registered for a notification
//! type and delivers the notification with one of four strategies:
//!
//! | Strategy | Behavior | Failure reporting |
//! |---|---|---|
//! | [`FanOut::Sequential`] | registration order, continues past failures | `Aggregate` |
//! | [`FanOut::FailFast`] | registration order, stops at the first failure | `Subscriber` |
//! | [`FanOut::Parallel`] | all concurrently, waits for all | `Aggregate` of all failures |
//! | [`FanOut::FireAndForget`] | each on a detached task | never; failures are logged |
//!
//! The strategy is chosen by the explicit argument, then the notification
//! type's [`Notification::STRATEGY`], then the publisher's default.

mod fail_fast;
mod fire_and_forget;
mod parallel;
mod sequential;

pub use fail_fast::FailFastDelivery;
pub use fire_and_forget::FireAndForgetDelivery;
pub use parallel::ParallelDelivery;
pub use sequential::SequentialDelivery;

use crate::config::PipelineConfig;
use courier_core::{
    AggregateError, BoxError, CancellationToken, CourierError, FanOut, Fatal, HandlerProvider,
    HostEnvironment, Notification, OperationContext, Outcome, PanicError, SubscriberEntry,
    SubscriberFailure, short_type_name,
};
use futures::FutureExt;
use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};
use tracing::{Instrument, debug};

/// Strategy for delivering a notification to a resolved set of subscribers.
///
/// This abstraction allows different execution models (sequential, parallel, etc.)
/// to be plugged into the publisher.
pub trait DeliveryStrategy: Send + Sync {
    /// Deliver `notification` to `subscribers`.
    fn deliver<N: Notification>(
        &self,
        notification: Arc<N>,
        subscribers: Vec<SubscriberEntry<N>>,
        operation: &OperationContext,
    ) -> impl Future<Output = Result<Outcome, Fatal>> + Send;
}

/// Fans notifications out to their subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let publisher = Publisher::new(registry).with_default_strategy(FanOut::Parallel);
/// publisher.publish(UserCreated { id: 7 }, None, &CancellationToken::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Publisher<P> {
    provider: P,
    default_strategy: FanOut,
    environment: Arc<HostEnvironment>,
}

impl<P: HandlerProvider> Publisher<P> {
    /// Create a publisher over `provider` using [`FanOut::Sequential`] by default.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            default_strategy: FanOut::default(),
            environment: Arc::default(),
        }
    }

    /// Strategy used when neither the caller nor the notification type picks one.
    pub fn with_default_strategy(mut self, strategy: FanOut) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Apply the publishing settings of `config`.
    pub fn with_config(self, config: &PipelineConfig) -> Self {
        self.with_default_strategy(config.default_strategy)
    }

    /// Use `environment` for every operation context this publisher creates.
    pub fn with_environment(mut self, environment: Arc<HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    /// The handler provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The configured default strategy.
    pub fn default_strategy(&self) -> FanOut {
        self.default_strategy
    }

    /// The strategy a publish of `N` would use.
    pub fn resolve_strategy<N: Notification>(&self, explicit: Option<FanOut>) -> FanOut {
        explicit.or(N::STRATEGY).unwrap_or(self.default_strategy)
    }

    /// Publish `notification` in a fresh operation context.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        strategy: Option<FanOut>,
        cancellation: &CancellationToken,
    ) -> Result<Outcome, Fatal> {
        let operation = OperationContext::builder()
            .environment(Arc::clone(&self.environment))
            .cancellation(cancellation.clone())
            .build();
        self.publish_with(notification, strategy, operation).await
    }

    /// Publish `notification` in an existing operation context.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        strategy: Option<FanOut>,
        operation: OperationContext,
    ) -> Result<Outcome, Fatal> {
        let strategy = self.resolve_strategy::<N>(strategy);
        let subscribers = self.provider.resolve_all::<N>();
        let span = tracing::debug_span!(
            "publish",
            notification = short_type_name::<N>(),
            %strategy,
            correlation_id = %operation.correlation_id(),
        );

        async move {
            debug!(subscribers = subscribers.len(), "publishing notification");
            if subscribers.is_empty() {
                return Ok(Outcome::completed());
            }
            let notification = Arc::new(notification);
            match strategy {
                FanOut::Sequential => {
                    SequentialDelivery
                        .deliver(notification, subscribers, &operation)
                        .await
                }
                FanOut::FailFast => {
                    FailFastDelivery
                        .deliver(notification, subscribers, &operation)
                        .await
                }
                FanOut::Parallel => {
                    ParallelDelivery
                        .deliver(notification, subscribers, &operation)
                        .await
                }
                FanOut::FireAndForget => {
                    FireAndForgetDelivery
                        .deliver(notification, subscribers, &operation)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Invoke one subscriber, catching panics.
///
/// The outer `Err` is a fatal error; the inner `Err` is the subscriber's
/// (non-fatal) failure.
pub(crate) async fn invoke<N: Notification>(
    entry: &SubscriberEntry<N>,
    notification: &N,
    operation: &OperationContext,
) -> Result<Result<(), SubscriberFailure>, Fatal> {
    let result = AssertUnwindSafe(entry.subscriber().handle_dyn(notification, operation))
        .catch_unwind()
        .await;
    let error: BoxError = match result {
        Ok(Ok(())) => return Ok(Ok(())),
        Ok(Err(error)) => Fatal::classify(error)?,
        Err(payload) => Box::new(PanicError::from_payload(payload)),
    };
    debug!(subscriber = entry.name(), %error, "subscriber failed");
    Ok(Err(SubscriberFailure::new(entry.name_tag(), error)))
}

/// `Success` when nothing failed, otherwise an `Aggregate` failure.
pub(crate) fn aggregate(attempted: usize, failures: Vec<SubscriberFailure>) -> Outcome {
    if failures.is_empty() {
        Outcome::completed()
    } else {
        Outcome::failure(CourierError::Aggregate(AggregateError::new(
            attempted, failures,
        )))
    }
}

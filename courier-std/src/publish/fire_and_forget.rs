use super::{DeliveryStrategy, invoke};
use courier_core::{Fatal, Notification, OperationContext, Outcome, SubscriberEntry};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{Instrument, Span, warn};

/// A detached delivery strategy.
///
/// Spawns each subscriber on its own tokio task and returns `Success`
/// immediately. Failures never reach the caller; they are logged.
///
/// Requires a running tokio runtime. Without one, the notification is
/// dropped and a warning is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct FireAndForgetDelivery;

impl DeliveryStrategy for FireAndForgetDelivery {
    async fn deliver<N: Notification>(
        &self,
        notification: Arc<N>,
        subscribers: Vec<SubscriberEntry<N>>,
        operation: &OperationContext,
    ) -> Result<Outcome, Fatal> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                subscribers = subscribers.len(),
                "no tokio runtime available; notification dropped"
            );
            return Ok(Outcome::completed());
        };

        for entry in subscribers {
            let notification = Arc::clone(&notification);
            let operation = operation.clone();
            let task = async move {
                match invoke(&entry, &notification, &operation).await {
                    Ok(Ok(())) => {}
                    Ok(Err(failure)) => warn!(
                        subscriber = failure.subscriber(),
                        error = %failure.error(),
                        "detached subscriber failed"
                    ),
                    Err(fatal) => warn!(
                        subscriber = entry.name(),
                        error = %fatal,
                        "detached subscriber stopped"
                    ),
                }
            };
            runtime.spawn(task.instrument(Span::current()));
        }
        Ok(Outcome::completed())
    }
}

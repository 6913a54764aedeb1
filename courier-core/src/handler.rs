//! # Terminal Layer (Handler / Subscriber)
//!
//! Handlers are the endpoint of a request pipeline; subscribers are the
//! endpoints of a notification fan-out. Both are plain async traits with an
//! object-safe `Dyn*` twin so that registries can store them type-erased.
//!
//! # Return Values
//!
//! A handler returns [`HandlerResult`]: `Ok(Outcome)` for every expected
//! result (including business failures), `Err` for a fault. Faults are
//! converted into a failed outcome at the dispatch boundary unless they are
//! [`Fatal`](crate::Fatal).
//!
//! A subscriber returns `Result<(), BoxError>`; any `Err` counts as the
//! subscriber's failure.

use crate::{
    context::OperationContext,
    error::BoxError,
    message::{Notification, Request},
    outcome::Outcome,
};
use futures::future::BoxFuture;
use std::{borrow::Cow, future::Future, sync::Arc};

/// What handlers and intercepts return.
///
/// `Err` models a fault escaping the pipeline node.
pub type HandlerResult<T> = Result<Outcome<T>, BoxError>;

/// The terminal endpoint of a request pipeline.
///
/// # Static vs Dynamic Dispatch
///
/// This trait uses native `async fn` for zero-cost static dispatch.
/// Registries store handlers as [`DynHandler`], which every `Handler`
/// implements automatically.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests of type `{R}`",
    label = "missing `Handler<{R}>` implementation",
    note = "Handlers must implement the `handle` method for the request type `{R}`."
)]
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handle the request.
    fn handle(
        &self,
        request: &R,
        operation: &OperationContext,
    ) -> impl Future<Output = HandlerResult<R::Response>> + Send;
}

/// Dynamic object-safe version of [`Handler`].
pub trait DynHandler<R: Request>: Send + Sync + 'static {
    /// Handle the request (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        operation: &'a OperationContext,
    ) -> BoxFuture<'a, HandlerResult<R::Response>>;
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<R: Request, H: Handler<R>> DynHandler<R> for H {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        operation: &'a OperationContext,
    ) -> BoxFuture<'a, HandlerResult<R::Response>> {
        Box::pin(self.handle(request, operation))
    }
}

/// An endpoint receiving published notifications.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot subscribe to `{N}`",
    label = "missing `Subscriber<{N}>` implementation",
    note = "Subscribers must implement the `handle` method for the notification type `{N}`."
)]
pub trait Subscriber<N: Notification>: Send + Sync + 'static {
    /// React to the notification.
    fn handle(
        &self,
        notification: &N,
        operation: &OperationContext,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`Subscriber`].
pub trait DynSubscriber<N: Notification>: Send + Sync + 'static {
    /// React to the notification (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        operation: &'a OperationContext,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<N: Notification, S: Subscriber<N>> DynSubscriber<N> for S {
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        operation: &'a OperationContext,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(notification, operation))
    }
}

/// A registered subscriber together with its identity.
pub struct SubscriberEntry<N: Notification> {
    name: Cow<'static, str>,
    subscriber: Arc<dyn DynSubscriber<N>>,
}

impl<N: Notification> SubscriberEntry<N> {
    /// Create a new entry.
    pub fn new(name: impl Into<Cow<'static, str>>, subscriber: Arc<dyn DynSubscriber<N>>) -> Self {
        Self {
            name: name.into(),
            subscriber,
        }
    }

    /// The subscriber's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as an owned tag (cheap for static names).
    pub fn name_tag(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    /// The subscriber.
    pub fn subscriber(&self) -> &Arc<dyn DynSubscriber<N>> {
        &self.subscriber
    }
}

impl<N: Notification> Clone for SubscriberEntry<N> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            subscriber: Arc::clone(&self.subscriber),
        }
    }
}

impl<N: Notification> std::fmt::Debug for SubscriberEntry<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Resolves handlers and subscribers by message type.
///
/// The core never mutates a provider; implementations are read-mostly
/// singletons populated at startup.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid HandlerProvider",
    label = "missing `HandlerProvider` implementation",
    note = "Implement `HandlerProvider` to resolve handlers and subscribers by type."
)]
pub trait HandlerProvider: Send + Sync + 'static {
    /// The handler registered for `R`, if any.
    fn resolve<R: Request>(&self) -> Option<Arc<dyn DynHandler<R>>>;

    /// Every subscriber registered for `N`, in registration order.
    fn resolve_all<N: Notification>(&self) -> Vec<SubscriberEntry<N>>;
}

impl<P: HandlerProvider> HandlerProvider for Arc<P> {
    fn resolve<R: Request>(&self) -> Option<Arc<dyn DynHandler<R>>> {
        (**self).resolve::<R>()
    }

    fn resolve_all<N: Notification>(&self) -> Vec<SubscriberEntry<N>> {
        (**self).resolve_all::<N>()
    }
}

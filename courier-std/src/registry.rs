//! Handler registry populated once at startup.
//!
//! Handlers and subscribers are keyed by the `TypeId` of their message type.
//! The built [`Registry`] is immutable and implements
//! [`HandlerProvider`], so it can be shared across tasks behind an `Arc`.

use courier_core::{
    DynHandler, DynSubscriber, Handler, HandlerProvider, Notification, Request, Subscriber,
    SubscriberEntry, short_type_name,
};
use std::{
    any::{Any, TypeId},
    borrow::Cow,
    collections::HashMap,
    sync::Arc,
};
use thiserror::Error;

type Erased = Box<dyn Any + Send + Sync>;

/// Errors detected while building a [`Registry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// More than one handler was registered for a request type.
    #[error("duplicate handler registered for request `{request}`")]
    DuplicateHandler {
        /// Short name of the request type.
        request: &'static str,
    },
}

/// An immutable map from message types to their handler and subscribers.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<TypeId, Erased>,
    subscribers: HashMap<TypeId, Erased>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Whether a handler is registered for `R`.
    pub fn contains_handler<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of subscribers registered for `N`.
    pub fn subscriber_count<N: Notification>(&self) -> usize {
        self.subscribers
            .get(&TypeId::of::<N>())
            .and_then(|list| list.downcast_ref::<Vec<SubscriberEntry<N>>>())
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handlers.len())
            .field("notification_types", &self.subscribers.len())
            .finish()
    }
}

impl HandlerProvider for Registry {
    fn resolve<R: Request>(&self) -> Option<Arc<dyn DynHandler<R>>> {
        self.handlers
            .get(&TypeId::of::<R>())?
            .downcast_ref::<Arc<dyn DynHandler<R>>>()
            .cloned()
    }

    fn resolve_all<N: Notification>(&self) -> Vec<SubscriberEntry<N>> {
        self.subscribers
            .get(&TypeId::of::<N>())
            .and_then(|list| list.downcast_ref::<Vec<SubscriberEntry<N>>>())
            .cloned()
            .unwrap_or_default()
    }
}

/// Builder for constructing a [`Registry`].
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::builder()
///     .handler::<GetUser, _>(GetUserHandler::new(db))
///     .subscriber::<UserCreated, _>(SendWelcomeMail)
///     .subscriber_named::<UserCreated, _>("search-index", IndexUser)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<TypeId, Erased>,
    subscribers: HashMap<TypeId, Erased>,
    duplicates: Vec<&'static str>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `R`.
    pub fn handler<R: Request, H: Handler<R>>(self, handler: H) -> Self {
        self.shared_handler::<R>(Arc::new(handler))
    }

    /// Register an already shared handler for `R`.
    pub fn shared_handler<R: Request>(mut self, handler: Arc<dyn DynHandler<R>>) -> Self {
        if self
            .handlers
            .insert(TypeId::of::<R>(), Box::new(handler))
            .is_some()
        {
            self.duplicates.push(short_type_name::<R>());
        }
        self
    }

    /// Register a subscriber for `N`, named after its type.
    pub fn subscriber<N: Notification, S: Subscriber<N>>(self, subscriber: S) -> Self {
        self.subscriber_named::<N, S>(short_type_name::<S>(), subscriber)
    }

    /// Register a subscriber for `N` under an explicit name.
    pub fn subscriber_named<N: Notification, S: Subscriber<N>>(
        self,
        name: impl Into<Cow<'static, str>>,
        subscriber: S,
    ) -> Self {
        self.shared_subscriber::<N>(name, Arc::new(subscriber))
    }

    /// Register an already shared subscriber for `N`.
    pub fn shared_subscriber<N: Notification>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        subscriber: Arc<dyn DynSubscriber<N>>,
    ) -> Self {
        let list = self
            .subscribers
            .entry(TypeId::of::<N>())
            .or_insert_with(|| Box::new(Vec::<SubscriberEntry<N>>::new()));
        if let Some(list) = list.downcast_mut::<Vec<SubscriberEntry<N>>>() {
            list.push(SubscriberEntry::new(name, subscriber));
        }
        self
    }

    /// Build the registry.
    ///
    /// Fails if any request type received more than one handler.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(&request) = self.duplicates.first() {
            return Err(RegistryError::DuplicateHandler { request });
        }
        Ok(Registry {
            handlers: self.handlers,
            subscribers: self.subscribers,
        })
    }
}

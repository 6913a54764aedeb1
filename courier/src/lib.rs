//! # courier - In-Process Request/Notification Pipeline
//!
//! `courier` routes **requests** to exactly one handler through an ordered
//! chain of intercepts, and fans **notifications** out to any number of
//! subscribers with a selectable strategy. Handlers report expected failures
//! as [`Outcome`] values; only cancellation and resource exhaustion escape
//! as [`Fatal`] errors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Message, Request)]
//! #[request(response = String)]
//! struct Greet { name: String }
//!
//! struct GreetHandler;
//! impl Handler<Greet> for GreetHandler {
//!     async fn handle(&self, request: &Greet, _: &OperationContext) -> HandlerResult<String> {
//!         Ok(Outcome::success(format!("hello, {}", request.name)))
//!     }
//! }
//!
//! let registry = Registry::builder().handler::<Greet, _>(GreetHandler).build()?;
//! let dispatcher = Dispatcher::new(registry, intercepts![]);
//! let outcome = dispatcher
//!     .dispatch(Greet { name: "ada".into() }, &CancellationToken::new())
//!     .await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use courier_core::{
    // Errors
    AggregateError,
    // Ports
    AuditRecord,
    AuditSink,
    AuthorizationEvaluator,
    BoxError,
    CachedResponse,
    // Context
    CancellationToken,
    Canceled,
    // Message
    Capabilities,
    Continuation,
    CourierError,
    // Handler
    DynHandler,
    DynSubscriber,
    ErrorKind,
    FanOut,
    Fatal,
    FatalKind,
    FieldError,
    Handler,
    HandlerProvider,
    HandlerResult,
    HostEnvironment,
    // Intercept
    Intercept,
    Message,
    Next,
    Notification,
    OperationContext,
    OperationContextBuilder,
    // Outcome
    Outcome,
    OutcomeStatus,
    PanicError,
    Request,
    RequestContext,
    Resource,
    ResponseCache,
    RuntimeKind,
    Subscriber,
    SubscriberEntry,
    SubscriberFailure,
    TelemetrySink,
    UnknownFanOut,
    UserIdentity,
    ValidationFailure,
    Validator,
    short_type_name,
};

// Pipeline
pub use courier_std::{
    chain::{Append, ChainBuilder, HCons, HListLen, HNil, InterceptChain},
    config::{CacheConfig, ConfigError, InterceptToggles, PerformanceConfig, PipelineConfig},
    dispatch::Dispatcher,
    publish::{
        DeliveryStrategy, FailFastDelivery, FireAndForgetDelivery, ParallelDelivery, Publisher,
        SequentialDelivery,
    },
    registry::{Registry, RegistryBuilder, RegistryError},
    standard::{StandardChain, StandardParts, standard_chain},
};

/// Built-in intercepts, and the `intercepts!` chain macro.
pub use courier_std::intercepts;

/// Default collaborators for the built-in intercepts.
pub mod adapters {
    pub use courier_std::{
        cache::MemoryCache,
        sinks::{TracingAuditSink, TracingTelemetry},
        validators::{RequestValidator, ValidatorRegistry},
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::testing::*;
}

#[cfg(feature = "macros")]
pub use courier_macros::{Message, Notification, Request};

/// Prelude module - common imports for Courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CancellationToken, Capabilities, CourierError, Dispatcher, FanOut, Fatal, Handler,
        HandlerResult, Intercept, Message, Next, Notification, OperationContext, Outcome,
        Publisher, Registry, Request, RequestContext, Resource, Subscriber, intercepts,
    };
}

//! # courier-core
//!
//! Core contracts for the Courier request/notification pipeline.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! handler, subscriber and intercept authors that don't need the full
//! `courier-std` implementation.
//!
//! # Two Paths
//!
//! ## Requests ([`Request`] → [`Handler`])
//!
//! A request is routed to exactly one handler. On the way it passes through
//! an ordered chain of [`Intercept`]s. Each intercept receives the
//! [`RequestContext`] and a [`Next`] continuation; it may call the
//! continuation, post-process its result, or short-circuit with a failure.
//!
//! ## Notifications ([`Notification`] → [`Subscriber`]s)
//!
//! A notification is fanned out to zero or more subscribers using one of
//! the [`FanOut`] strategies. A notification type may declare its preferred
//! strategy statically.
//!
//! # Outcomes
//!
//! Expected failures (validation, authorization, missing handler, business
//! rejections) travel as [`Outcome::Failure`]. An `Err` returned from a
//! handler or intercept is an escaped fault; the dispatcher converts it to a
//! failure unless it is [`Fatal`] (cancellation, allocation failure).
//!
//! # Error Types
//!
//! - [`CourierError`] - The error carried by a failed [`Outcome`]
//! - [`Fatal`] - Errors that are never converted into outcomes
//! - [`BoxError`] - Type-erased error escaping a handler

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod handler;
mod intercept;
mod message;
mod outcome;
mod ports;

// Re-exports
pub use context::{
    CancellationToken, Canceled, HostEnvironment, OperationContext, OperationContextBuilder,
    RequestContext, RuntimeKind, UserIdentity,
};
pub use error::{
    AggregateError, BoxError, CourierError, ErrorKind, Fatal, FatalKind, FieldError, PanicError,
    SubscriberFailure, ValidationFailure,
};
pub use handler::{
    DynHandler, DynSubscriber, Handler, HandlerProvider, HandlerResult, Subscriber,
    SubscriberEntry,
};
pub use intercept::{Continuation, Intercept, Next};
pub use message::{
    Capabilities, FanOut, Message, Notification, Request, Resource, UnknownFanOut, short_type_name,
};
pub use outcome::{Outcome, OutcomeStatus};
pub use ports::{
    AuditRecord, AuditSink, AuthorizationEvaluator, CachedResponse, ResponseCache, TelemetrySink,
    Validator,
};

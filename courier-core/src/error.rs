//! Error types for Courier.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`CourierError`] - The error carried by a failed [`Outcome`](crate::Outcome)
//! - [`ValidationFailure`] - Field-level validation errors
//! - [`SubscriberFailure`] / [`AggregateError`] - Publish failures
//! - [`Fatal`] - Errors that bypass outcome conversion

use crate::{context::Canceled, message::Resource};
use std::{any::Any, borrow::Cow, collections::TryReserveError, fmt};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Discriminant of a [`CourierError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No handler registered for the request type.
    NoHandler,
    /// The request failed validation.
    Validation,
    /// The request was denied by authorization.
    Forbidden,
    /// A handler or intercept returned an error.
    Handler,
    /// A handler, subscriber or combinator panicked.
    Panicked,
    /// A single subscriber failed.
    Subscriber,
    /// One or more subscribers failed.
    Aggregate,
    /// A generic failure with a message.
    Message,
    /// Any other error.
    Other,
}

/// The error carried by a failed [`Outcome`](crate::Outcome).
#[derive(Error, Debug)]
pub enum CourierError {
    /// No handler was registered for the request type.
    #[error("no handler registered for request `{request}`")]
    NoHandler {
        /// Short name of the request type.
        request: &'static str,
    },

    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// The principal may not act on the resource.
    #[error("access to `{resource}` is forbidden: {reason}")]
    Forbidden {
        /// The resource that was evaluated.
        resource: Resource,
        /// Why access was denied.
        reason: String,
    },

    /// A handler or intercept returned an error; the original is kept as source.
    #[error("handler for `{request}` failed: {source}")]
    Handler {
        /// Short name of the request type.
        request: &'static str,
        /// The error that escaped the pipeline.
        #[source]
        source: BoxError,
    },

    /// A panic was caught and converted.
    #[error("`{operation}` panicked: {panic}")]
    Panicked {
        /// Where the panic was caught.
        operation: &'static str,
        /// The panic payload.
        #[source]
        panic: PanicError,
    },

    /// A single subscriber failed (fail-fast publishing).
    #[error(transparent)]
    Subscriber(#[from] SubscriberFailure),

    /// One or more subscribers failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A generic failure.
    #[error("{0}")]
    Message(String),

    /// Any other error.
    #[error(transparent)]
    Other(BoxError),
}

impl CourierError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourierError::NoHandler { .. } => ErrorKind::NoHandler,
            CourierError::Validation(_) => ErrorKind::Validation,
            CourierError::Forbidden { .. } => ErrorKind::Forbidden,
            CourierError::Handler { .. } => ErrorKind::Handler,
            CourierError::Panicked { .. } => ErrorKind::Panicked,
            CourierError::Subscriber(_) => ErrorKind::Subscriber,
            CourierError::Aggregate(_) => ErrorKind::Aggregate,
            CourierError::Message(_) => ErrorKind::Message,
            CourierError::Other(_) => ErrorKind::Other,
        }
    }

    /// Create a forbidden error.
    pub fn forbidden(resource: Resource, reason: impl Into<String>) -> Self {
        CourierError::Forbidden {
            resource,
            reason: reason.into(),
        }
    }

    /// Returns the aggregate, if this is a publish aggregate.
    pub fn as_aggregate(&self) -> Option<&AggregateError> {
        match self {
            CourierError::Aggregate(aggregate) => Some(aggregate),
            _ => None,
        }
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            CourierError::Validation(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<BoxError> for CourierError {
    fn from(err: BoxError) -> Self {
        CourierError::Other(err)
    }
}

impl From<String> for CourierError {
    fn from(message: String) -> Self {
        CourierError::Message(message)
    }
}

impl From<&str> for CourierError {
    fn from(message: &str) -> Self {
        CourierError::Message(message.to_string())
    }
}

// ============================================================================
// Validation
// ============================================================================

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    field: String,
    message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The offending field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// What is wrong with it.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A collection of field errors produced by validators.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("validation failed: {}", join_field_errors(.errors))]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    /// Create an empty failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field error (builder style).
    pub fn field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    /// Add a field error.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Append every error of `other`.
    pub fn merge(&mut self, other: ValidationFailure) {
        self.errors.extend(other.errors);
    }

    /// The collected errors.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// Panics
// ============================================================================

/// A caught panic, rendered as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("panicked: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Build from a payload returned by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Publish failures
// ============================================================================

/// A failure of one subscriber, tagged with the subscriber's identity.
#[derive(Error, Debug)]
#[error("subscriber `{subscriber}` failed: {source}")]
pub struct SubscriberFailure {
    subscriber: Cow<'static, str>,
    #[source]
    source: BoxError,
}

impl SubscriberFailure {
    /// Create a new subscriber failure.
    pub fn new(subscriber: impl Into<Cow<'static, str>>, source: BoxError) -> Self {
        Self {
            subscriber: subscriber.into(),
            source,
        }
    }

    /// The registered name of the failing subscriber.
    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    /// The error the subscriber produced.
    pub fn error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.source
    }

    /// Consume and return the subscriber's error.
    pub fn into_error(self) -> BoxError {
        self.source
    }
}

/// Failures of several subscribers of one publish call.
#[derive(Error, Debug)]
#[error("{} of {attempted} subscriber(s) failed", .failures.len())]
pub struct AggregateError {
    attempted: usize,
    failures: Vec<SubscriberFailure>,
}

impl AggregateError {
    /// Create an aggregate over `failures` out of `attempted` subscribers.
    pub fn new(attempted: usize, failures: Vec<SubscriberFailure>) -> Self {
        Self {
            attempted,
            failures,
        }
    }

    /// One entry per failed subscriber.
    pub fn failures(&self) -> &[SubscriberFailure] {
        &self.failures
    }

    /// Number of failed subscribers.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether the aggregate is empty.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of subscribers that were invoked.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Names of the failed subscribers.
    pub fn subscribers(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(SubscriberFailure::subscriber)
    }
}

// ============================================================================
// Fatal errors
// ============================================================================

/// The category of a [`Fatal`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FatalKind {
    /// Cooperative cancellation was observed.
    Canceled,
    /// Memory could not be allocated.
    ResourceExhausted,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalKind::Canceled => f.write_str("cancellation"),
            FatalKind::ResourceExhausted => f.write_str("resource exhaustion"),
        }
    }
}

/// An error that is never converted into an [`Outcome`](crate::Outcome).
///
/// Dispatch and publish return it in their outer `Err`. The original error is
/// preserved unchanged and available through [`Fatal::into_inner`].
///
/// Stack overflow and allocator aborts terminate the process and are never
/// observed here; allocation failures reported through
/// [`TryReserveError`] are.
#[derive(Error, Debug)]
#[error("fatal {kind}: {source}")]
pub struct Fatal {
    kind: FatalKind,
    #[source]
    source: BoxError,
}

impl Fatal {
    /// A cancellation fatal.
    pub fn canceled() -> Self {
        Self {
            kind: FatalKind::Canceled,
            source: Box::new(Canceled),
        }
    }

    /// Split an escaped error into recoverable (`Ok`) or fatal (`Err`).
    ///
    /// The whole source chain is inspected, so a wrapped [`Canceled`] is
    /// still fatal.
    pub fn classify(error: BoxError) -> Result<BoxError, Fatal> {
        match Self::kind_of(&*error) {
            Some(kind) => Err(Fatal {
                kind,
                source: error,
            }),
            None => Ok(error),
        }
    }

    /// The fatal category of `error`, if any.
    pub fn kind_of(error: &(dyn std::error::Error + 'static)) -> Option<FatalKind> {
        let mut current = Some(error);
        while let Some(err) = current {
            if err.is::<Canceled>() {
                return Some(FatalKind::Canceled);
            }
            if err.is::<TryReserveError>() {
                return Some(FatalKind::ResourceExhausted);
            }
            current = err.source();
        }
        None
    }

    /// The fatal category.
    pub fn kind(&self) -> FatalKind {
        self.kind
    }

    /// Whether this is a cancellation.
    pub fn is_canceled(&self) -> bool {
        self.kind == FatalKind::Canceled
    }

    /// The original error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.source
    }

    /// Consume and return the original error.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

//! Collaborator contracts consumed by the built-in intercepts.
//!
//! Courier only defines the invocation points; rule engines, cache stores and
//! audit storage live behind these traits.

use crate::{
    context::OperationContext,
    message::{Request, Resource},
    outcome::{Outcome, OutcomeStatus},
};
use chrono::{DateTime, Utc};
use std::{any::Any, future::Future, sync::Arc, time::Duration};
use uuid::Uuid;

/// Validates requests before they reach the handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Validator",
    label = "missing `Validator` implementation"
)]
pub trait Validator: Send + Sync + 'static {
    /// `Success` to continue, `Failure` to reject the request.
    fn validate<R: Request>(&self, request: &R) -> impl Future<Output = Outcome> + Send;
}

/// Decides whether the current principal may act on a resource.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an AuthorizationEvaluator",
    label = "missing `AuthorizationEvaluator` implementation"
)]
pub trait AuthorizationEvaluator: Send + Sync + 'static {
    /// `Success` to allow, `Failure` to deny.
    fn evaluate(
        &self,
        resource: &Resource,
        operation: &OperationContext,
    ) -> impl Future<Output = Outcome> + Send;
}

/// A type-erased cached response.
pub type CachedResponse = Arc<dyn Any + Send + Sync>;

/// Storage for cached responses.
pub trait ResponseCache: Send + Sync + 'static {
    /// Look up an entry that has not expired.
    fn get(&self, key: &str) -> impl Future<Output = Option<CachedResponse>> + Send;

    /// Store an entry for `expiration`.
    fn set(
        &self,
        key: &str,
        value: CachedResponse,
        expiration: Duration,
    ) -> impl Future<Output = ()> + Send;
}

/// Receives request timings.
pub trait TelemetrySink: Send + Sync + 'static {
    /// Record how long `operation` took and how it ended.
    fn record_duration(&self, operation: &str, elapsed: Duration, status: OutcomeStatus);
}

/// One audited request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Short name of the request type.
    pub request: &'static str,
    /// Correlation id of the operation.
    pub correlation_id: Uuid,
    /// Acting principal, if authenticated.
    pub user_id: Option<String>,
    /// How the request ended.
    pub status: OutcomeStatus,
    /// Time spent in the inner chain.
    pub elapsed: Duration,
    /// When the operation started.
    pub timestamp: DateTime<Utc>,
}

/// Receives audit records.
pub trait AuditSink: Send + Sync + 'static {
    /// Persist or forward the record.
    fn record(&self, record: AuditRecord) -> impl Future<Output = ()> + Send;
}

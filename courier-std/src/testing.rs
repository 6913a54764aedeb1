//! Testing utilities for Courier.
//!
//! This module provides small, shareable doubles for pipeline tests.
//!
//! # Features
//!
//! - [`CallLog`]: An ordered, cloneable log of pipeline events
//! - [`RecordingIntercept`]: An intercept that logs before/after `next`
//! - [`StubHandler`]: A handler returning a fixed response
//! - [`CountingSubscriber`] / [`FailingSubscriber`]: Subscribers with call counters
//! - [`RecordingTelemetry`] / [`RecordingAuditSink`]: Sinks that keep what they receive
//! - [`StaticEvaluator`]: An authorization evaluator with a fixed verdict

use courier_core::{
    AuditRecord, AuditSink, AuthorizationEvaluator, BoxError, Capabilities, Handler,
    HandlerResult, Intercept, Next, Notification, OperationContext, Outcome, OutcomeStatus,
    Request, RequestContext, Resource, Subscriber, TelemetrySink,
};
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Call Log
// ============================================================================

/// An ordered log shared between test doubles.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let chain = intercepts![
///     RecordingIntercept::new("outer", log.clone()),
///     RecordingIntercept::new("inner", log.clone()),
/// ];
/// // ... dispatch ...
/// assert_eq!(
///     log.entries(),
///     ["outer:before", "inner:before", "handler", "inner:after", "outer:after"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    /// Snapshot of the entries.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing was logged.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

// ============================================================================
// Recording Intercept
// ============================================================================

/// An intercept that logs `"{name}:before"` and `"{name}:after"` around `next`.
///
/// A short-circuiting instance logs `"{name}:short"` and returns a failure
/// without calling `next`.
#[derive(Debug, Clone)]
pub struct RecordingIntercept {
    name: &'static str,
    log: CallLog,
    short_circuit: bool,
    only_for: Option<Capabilities>,
}

impl RecordingIntercept {
    /// Create an intercept that always calls `next`.
    pub fn new(name: &'static str, log: CallLog) -> Self {
        Self {
            name,
            log,
            short_circuit: false,
            only_for: None,
        }
    }

    /// Create an intercept that never calls `next`.
    pub fn short_circuit(name: &'static str, log: CallLog) -> Self {
        Self {
            short_circuit: true,
            ..Self::new(name, log)
        }
    }

    /// Restrict the intercept to requests carrying `capabilities`.
    pub fn only_for(mut self, capabilities: Capabilities) -> Self {
        self.only_for = Some(capabilities);
        self
    }
}

impl Intercept for RecordingIntercept {
    fn name(&self) -> &'static str {
        self.name
    }

    fn applies_to(&self, capabilities: Capabilities) -> bool {
        self.only_for.is_none_or(|required| capabilities.contains(required))
    }

    async fn intercept<R: Request>(
        &self,
        _ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        self.log.push(format!("{}:before", self.name));
        if self.short_circuit {
            self.log.push(format!("{}:short", self.name));
            return Ok(Outcome::fail(format!("short-circuited by {}", self.name)));
        }
        let outcome = next.run().await?;
        self.log.push(format!("{}:after", self.name));
        Ok(outcome)
    }
}

// ============================================================================
// Stub Handler
// ============================================================================

/// A handler that returns a clone of a fixed response and counts calls.
#[derive(Debug, Clone)]
pub struct StubHandler<T> {
    response: T,
    calls: Arc<AtomicUsize>,
    log: Option<CallLog>,
}

impl<T> StubHandler<T> {
    /// Create a handler responding with `response`.
    pub fn new(response: T) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Log `"handler"` on every call.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Number of times the handler ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the handler ran at least once.
    pub fn was_called(&self) -> bool {
        self.calls() > 0
    }
}

impl<R, T> Handler<R> for StubHandler<T>
where
    R: Request<Response = T>,
    T: Clone + Send + Sync + 'static,
{
    async fn handle(&self, _request: &R, _operation: &OperationContext) -> HandlerResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.push("handler");
        }
        Ok(Outcome::success(self.response.clone()))
    }
}

// ============================================================================
// Subscribers
// ============================================================================

/// A subscriber that counts deliveries and optionally logs its name.
#[derive(Debug, Clone)]
pub struct CountingSubscriber {
    name: &'static str,
    count: Arc<AtomicUsize>,
    log: Option<CallLog>,
    delay: Option<Duration>,
}

impl CountingSubscriber {
    /// Create a counting subscriber.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            count: Arc::new(AtomicUsize::new(0)),
            log: None,
            delay: None,
        }
    }

    /// Log the subscriber's name on every delivery.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Sleep before completing each delivery.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of deliveries.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<N: Notification> Subscriber<N> for CountingSubscriber {
    async fn handle(
        &self,
        _notification: &N,
        _operation: &OperationContext,
    ) -> Result<(), BoxError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.push(self.name);
        }
        Ok(())
    }
}

/// A subscriber that always fails with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingSubscriber {
    message: &'static str,
    count: Arc<AtomicUsize>,
    log: Option<CallLog>,
}

impl FailingSubscriber {
    /// Create a subscriber failing with `message`.
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            count: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Log the failure message on every delivery.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Number of deliveries.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<N: Notification> Subscriber<N> for FailingSubscriber {
    async fn handle(
        &self,
        _notification: &N,
        _operation: &OperationContext,
    ) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.push(self.message);
        }
        Err(self.message.into())
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// A telemetry sink that keeps every sample.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    samples: Arc<Mutex<Vec<(String, Duration, OutcomeStatus)>>>,
}

impl RecordingTelemetry {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded samples.
    pub fn samples(&self) -> Vec<(String, Duration, OutcomeStatus)> {
        lock(&self.samples).clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record_duration(&self, operation: &str, elapsed: Duration, status: OutcomeStatus) {
        lock(&self.samples).push((operation.to_string(), elapsed, status));
    }
}

/// An audit sink that keeps every record.
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl RecordingAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries.
    pub fn records(&self) -> Vec<AuditRecord> {
        lock(&self.records).clone()
    }
}

impl AuditSink for RecordingAuditSink {
    async fn record(&self, record: AuditRecord) {
        lock(&self.records).push(record);
    }
}

// ============================================================================
// Authorization
// ============================================================================

/// An evaluator with a fixed verdict.
#[derive(Debug, Clone)]
pub struct StaticEvaluator {
    verdict: Outcome,
    calls: Arc<AtomicUsize>,
}

impl StaticEvaluator {
    /// Allow every resource.
    pub fn allow() -> Self {
        Self {
            verdict: Outcome::completed(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deny every resource with a plain failure message.
    pub fn deny(reason: &str) -> Self {
        Self {
            verdict: Outcome::fail(reason),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of evaluations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthorizationEvaluator for StaticEvaluator {
    async fn evaluate(&self, _resource: &Resource, _operation: &OperationContext) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

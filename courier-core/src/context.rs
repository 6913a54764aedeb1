//! # Operation and Request Context
//!
//! Every dispatch and publish runs inside an [`OperationContext`]: who is
//! acting, in which host environment, under which correlation id, since
//! when, and with which [`CancellationToken`].
//!
//! A dispatch wraps the request and its operation context in a
//! [`RequestContext`]. It is created once per dispatch and borrowed by every
//! intercept of the chain; nothing in the pipeline can rebuild it.
//!
//! The host environment (environment name and [`RuntimeKind`]) is
//! initialized once at startup and shared by `Arc`, so diagnostics never
//! depend on process-wide globals.

use crate::message::{Capabilities, Request, short_type_name};
use chrono::{DateTime, Utc};
use futures::future::{Either, select};
use std::{
    future::Future,
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::Notify;
use uuid::Uuid;

// ============================================================================
// Cancellation
// ============================================================================

/// Error signalling that an operation observed cancellation.
///
/// Returning it (or an error whose source chain contains it) from a handler
/// or subscriber makes the dispatch fail with a [`Fatal`](crate::Fatal)
/// instead of a failed outcome.
#[derive(thiserror::Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("operation was canceled")]
pub struct Canceled;

/// A cooperative cancellation signal shared between a caller and the
/// handlers it invokes.
///
/// Cancellation is advisory: handlers observe it through
/// [`check`](Self::check), [`canceled`](Self::canceled) or
/// [`guard`](Self::guard).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    canceled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a token that is not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.canceled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    /// `Err(Canceled)` once cancellation was requested.
    ///
    /// Designed for `?` inside handlers:
    ///
    /// ```rust,ignore
    /// operation.cancellation().check()?;
    /// ```
    pub fn check(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }

    /// Completes when cancellation is requested.
    pub async fn canceled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_canceled() {
                return;
            }
            notified.await;
        }
    }

    /// Run `future` unless cancellation is requested first.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, Canceled> {
        let canceled = pin!(self.canceled());
        let future = pin!(future);
        match select(future, canceled).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(((), _)) => Err(Canceled),
        }
    }
}

// ============================================================================
// Identity and environment
// ============================================================================

/// The principal on whose behalf an operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    id: Option<String>,
    name: Option<String>,
    roles: Vec<String>,
}

impl UserIdentity {
    /// An unauthenticated principal.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated principal.
    pub fn authenticated(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            roles: Vec::new(),
        }
    }

    /// Grant a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// The principal's id.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The principal's display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Granted roles.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Whether the role was granted.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the principal is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// The kind of host process the pipeline runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuntimeKind {
    /// A long-running server (web/API host).
    #[default]
    Server,
    /// An interactive client application.
    Client,
    /// A short-lived serverless function.
    Function,
    /// A background worker.
    Worker,
}

/// Host-level facts, initialized once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    name: String,
    runtime: RuntimeKind,
}

impl HostEnvironment {
    /// Create a host environment.
    pub fn new(name: impl Into<String>, runtime: RuntimeKind) -> Self {
        Self {
            name: name.into(),
            runtime,
        }
    }

    /// Environment name (e.g. `Production`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The host runtime kind.
    pub fn runtime(&self) -> RuntimeKind {
        self.runtime
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new("Development", RuntimeKind::Server)
    }
}

// ============================================================================
// Operation context
// ============================================================================

/// Ambient facts of one dispatch or publish call.
#[derive(Debug, Clone)]
pub struct OperationContext {
    user: UserIdentity,
    environment: Arc<HostEnvironment>,
    correlation_id: Uuid,
    timestamp: DateTime<Utc>,
    started: Instant,
    cancellation: CancellationToken,
}

impl OperationContext {
    /// Start building a context.
    pub fn builder() -> OperationContextBuilder {
        OperationContextBuilder::default()
    }

    /// The acting principal.
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// The host environment.
    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    /// Correlation id shared by everything this operation triggers.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Wall-clock time the operation started.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Monotonic start instant.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time elapsed since the operation started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The cancellation token threaded through the operation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`OperationContext`].
#[derive(Debug, Default)]
pub struct OperationContextBuilder {
    user: Option<UserIdentity>,
    environment: Option<Arc<HostEnvironment>>,
    correlation_id: Option<Uuid>,
    cancellation: Option<CancellationToken>,
}

impl OperationContextBuilder {
    /// Set the acting principal (default: anonymous).
    pub fn user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    /// Set the host environment.
    pub fn environment(mut self, environment: Arc<HostEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Reuse an existing correlation id (default: a new v4 id).
    pub fn correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Set the cancellation token (default: never canceled).
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Stamp the start time and build the context.
    pub fn build(self) -> OperationContext {
        OperationContext {
            user: self.user.unwrap_or_default(),
            environment: self.environment.unwrap_or_default(),
            correlation_id: self.correlation_id.unwrap_or_else(Uuid::new_v4),
            timestamp: Utc::now(),
            started: Instant::now(),
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Request context
// ============================================================================

/// A request together with the operation it runs in.
///
/// Created once per dispatch and shared unchanged by the whole intercept chain.
#[derive(Debug)]
pub struct RequestContext<R> {
    request: R,
    operation: OperationContext,
    request_name: &'static str,
}

impl<R: Request> RequestContext<R> {
    /// Wrap a request.
    pub fn new(request: R, operation: OperationContext) -> Self {
        Self {
            request,
            operation,
            request_name: short_type_name::<R>(),
        }
    }

    /// The request.
    pub fn request(&self) -> &R {
        &self.request
    }

    /// The operation context.
    pub fn operation(&self) -> &OperationContext {
        &self.operation
    }

    /// Short name of the request type.
    pub fn request_name(&self) -> &'static str {
        self.request_name
    }

    /// Fully qualified name of the request type.
    pub fn request_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    /// The request type's capabilities.
    pub fn capabilities(&self) -> Capabilities {
        R::CAPABILITIES
    }

    /// The operation's cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        self.operation.cancellation()
    }

    /// Unwrap the request.
    pub fn into_request(self) -> R {
        self.request
    }
}

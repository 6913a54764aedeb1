//! # Intercept Layer
//!
//! An intercept is a composable pipeline stage wrapping the terminal handler
//! call. It receives the [`RequestContext`] and a [`Next`] continuation and
//! may:
//!
//! 1. call `next` and pass its result through,
//! 2. call `next` and post-process or replace the result,
//! 3. skip `next` and return a failure (short-circuit),
//! 4. call `next` several times (`Next` is `Copy`).
//!
//! Intercepts communicate short-circuits through [`Outcome`](crate::Outcome),
//! never through `Err`. An `Err` escaping `next` is a fault and should be
//! propagated with `?` unless the intercept exists to handle faults.

use crate::{
    context::RequestContext,
    handler::HandlerResult,
    message::{Capabilities, Request},
};
use futures::future::BoxFuture;
use std::future::Future;

/// A cross-cutting stage of the request pipeline.
///
/// One implementation serves every request type: the method is generic over
/// the request, and [`applies_to`](Self::applies_to) filters by capability.
///
/// # Example
///
/// ```rust,ignore
/// struct Timing;
///
/// impl Intercept for Timing {
///     fn name(&self) -> &'static str { "timing" }
///
///     async fn intercept<R: Request>(
///         &self,
///         ctx: &RequestContext<R>,
///         next: Next<'_, R>,
///     ) -> HandlerResult<R::Response> {
///         let started = Instant::now();
///         let outcome = next.run().await?;
///         tracing::debug!(request = ctx.request_name(), elapsed = ?started.elapsed());
///         Ok(outcome)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an Intercept",
    label = "missing `Intercept` implementation",
    note = "Intercepts must implement `name` and `intercept`."
)]
pub trait Intercept: Send + Sync + 'static {
    /// Name used in chain plans and logs.
    fn name(&self) -> &'static str;

    /// Whether this intercept takes part in pipelines for requests with
    /// `capabilities`. Defaults to every request.
    fn applies_to(&self, capabilities: Capabilities) -> bool {
        let _ = capabilities;
        true
    }

    /// Run the stage.
    fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> impl Future<Output = HandlerResult<R::Response>> + Send;
}

/// The remainder of a pipeline, as seen from one intercept.
pub trait Continuation<R: Request>: Send + Sync {
    /// Run the remainder against `ctx`.
    fn proceed<'a>(
        &'a self,
        ctx: &'a RequestContext<R>,
    ) -> BoxFuture<'a, HandlerResult<R::Response>>;
}

/// Handle to the inner intercepts and the terminal handler.
///
/// `Next` captures the same [`RequestContext`] the intercept received, so
/// the context flows through the chain unchanged.
pub struct Next<'a, R: Request> {
    ctx: &'a RequestContext<R>,
    rest: &'a dyn Continuation<R>,
}

impl<'a, R: Request> Next<'a, R> {
    /// Create a continuation over `rest`.
    pub fn new(ctx: &'a RequestContext<R>, rest: &'a dyn Continuation<R>) -> Self {
        Self { ctx, rest }
    }

    /// Invoke the inner intercepts and the handler.
    pub fn run(self) -> BoxFuture<'a, HandlerResult<R::Response>> {
        self.rest.proceed(self.ctx)
    }
}

impl<R: Request> Clone for Next<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Request> Copy for Next<'_, R> {}

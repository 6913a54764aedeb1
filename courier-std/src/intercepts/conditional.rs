use courier_core::{Capabilities, HandlerResult, Intercept, Next, Request, RequestContext};
use std::sync::atomic::{AtomicBool, Ordering};

/// An intercept that can be switched on and off at runtime.
///
/// While disabled, the wrapped intercept is left out of the chain as if it
/// did not apply to any request.
///
/// # Example
///
/// ```rust,ignore
/// let chain = intercepts![
///     Conditional::new(Performance::new(telemetry), config.intercepts.performance),
///     Caching::new(cache),
/// ];
/// dispatcher.chain().head.set_enabled(false);
/// ```
#[derive(Debug)]
pub struct Conditional<I> {
    inner: I,
    enabled: AtomicBool,
}

impl<I> Conditional<I> {
    /// Wrap `inner`, initially enabled or not.
    pub fn new(inner: I, enabled: bool) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Wrap `inner`, initially enabled.
    pub fn enabled(inner: I) -> Self {
        Self::new(inner, true)
    }

    /// Wrap `inner`, initially disabled.
    pub fn disabled(inner: I) -> Self {
        Self::new(inner, false)
    }

    /// Whether the inner intercept currently runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Switch the inner intercept on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// The wrapped intercept.
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I: Intercept> Intercept for Conditional<I> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn applies_to(&self, capabilities: Capabilities) -> bool {
        self.is_enabled() && self.inner.applies_to(capabilities)
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        if self.is_enabled() {
            self.inner.intercept(ctx, next).await
        } else {
            next.run().await
        }
    }
}

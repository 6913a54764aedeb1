use courier_core::{
    HandlerResult, Intercept, Next, OutcomeStatus, Request, RequestContext, TelemetrySink,
};
use std::time::{Duration, Instant};
use tracing::warn;

/// Measures how long the inner chain takes.
///
/// Always calls `next` and never alters its result. Each request produces
/// one sample `(request name, elapsed, status)` for the telemetry sink.
/// With a slow threshold, requests exceeding it are also logged as warnings.
#[derive(Debug, Clone, Default)]
pub struct Performance<S> {
    sink: S,
    slow_threshold: Option<Duration>,
}

impl<S> Performance<S> {
    /// Report timings to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            slow_threshold: None,
        }
    }

    /// Log requests slower than `threshold`.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// The configured slow threshold.
    pub fn slow_threshold(&self) -> Option<Duration> {
        self.slow_threshold
    }
}

impl<S: TelemetrySink> Intercept for Performance<S> {
    fn name(&self) -> &'static str {
        "performance"
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let started = Instant::now();
        let result = next.run().await;
        let elapsed = started.elapsed();
        let status = match &result {
            Ok(outcome) => outcome.status(),
            Err(_) => OutcomeStatus::Fault,
        };

        self.sink.record_duration(ctx.request_name(), elapsed, status);
        if let Some(threshold) = self.slow_threshold {
            if elapsed > threshold {
                warn!(
                    request = ctx.request_name(),
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX),
                    "slow request"
                );
            }
        }
        result
    }
}

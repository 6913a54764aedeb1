use courier_core::{
    CourierError, Fatal, HandlerResult, Intercept, Next, Outcome, PanicError, Request,
    RequestContext,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::warn;

/// Converts errors and panics escaping the inner chain into failures.
///
/// Place it outside intercepts that should observe a failed outcome instead
/// of a fault (an outer `Performance` then records `Failure`, not `Fault`).
/// Fatal errors are passed through unchanged so the dispatcher still
/// surfaces them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

impl Intercept for Recover {
    fn name(&self) -> &'static str {
        "recover"
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let request = ctx.request_name();
        match AssertUnwindSafe(next.run()).catch_unwind().await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(error)) => match Fatal::classify(error) {
                Ok(source) => {
                    warn!(request, error = %source, "recovered from handler error");
                    Ok(Outcome::failure(CourierError::Handler { request, source }))
                }
                Err(fatal) => Err(fatal.into_inner()),
            },
            Err(payload) => {
                let panic = PanicError::from_payload(payload);
                warn!(request, panic = panic.message(), "recovered from panic");
                Ok(Outcome::failure(CourierError::Panicked {
                    operation: request,
                    panic,
                }))
            }
        }
    }
}

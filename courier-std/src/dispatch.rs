//! Request dispatching.
//!
//! The [`Dispatcher`] resolves the handler for a request type, runs the
//! request through its intercept chain, and turns whatever comes back into
//! an [`Outcome`]:
//!
//! | Chain result | Dispatch result |
//! |---|---|
//! | `Ok(outcome)` | `Ok(outcome)` |
//! | no handler registered | `Ok(Failure(NoHandler))` |
//! | `Err` (non-fatal) | `Ok(Failure(Handler { source }))` |
//! | panic | `Ok(Failure(Panicked))` |
//! | `Err` (fatal) | `Err(Fatal)` |

use crate::chain::InterceptChain;
use courier_core::{
    BoxError, CancellationToken, CourierError, Fatal, HandlerProvider, HandlerResult,
    HostEnvironment, OperationContext, Outcome, PanicError, Request, RequestContext,
};
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tracing::{Instrument, Level, debug, error, warn};

/// Routes each request to its single handler through an intercept chain.
///
/// The dispatcher holds only immutable shared state and can be used from
/// any number of tasks at once.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new(registry, intercepts![Validation::new(validators)]);
/// let outcome = dispatcher.dispatch(GetUser { id: 7 }, &CancellationToken::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher<P, C> {
    provider: P,
    chain: C,
    environment: Arc<HostEnvironment>,
}

impl<P, C> Dispatcher<P, C>
where
    P: HandlerProvider,
    C: InterceptChain,
{
    /// Create a dispatcher over `provider` with the given intercept chain.
    pub fn new(provider: P, chain: C) -> Self {
        Self {
            provider,
            chain,
            environment: Arc::default(),
        }
    }

    /// Use `environment` for every operation context this dispatcher creates.
    pub fn with_environment(mut self, environment: Arc<HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    /// The handler provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The intercept chain.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// The host environment.
    pub fn environment(&self) -> &Arc<HostEnvironment> {
        &self.environment
    }

    /// Dispatch `request` in a fresh operation context.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        cancellation: &CancellationToken,
    ) -> Result<Outcome<R::Response>, Fatal> {
        let operation = OperationContext::builder()
            .environment(Arc::clone(&self.environment))
            .cancellation(cancellation.clone())
            .build();
        self.dispatch_with(request, operation).await
    }

    /// Dispatch `request` in an existing operation context.
    pub async fn dispatch_with<R: Request>(
        &self,
        request: R,
        operation: OperationContext,
    ) -> Result<Outcome<R::Response>, Fatal> {
        let ctx = RequestContext::new(request, operation);
        let span = tracing::debug_span!(
            "dispatch",
            request = ctx.request_name(),
            correlation_id = %ctx.operation().correlation_id(),
        );
        self.run(&ctx).instrument(span).await
    }

    async fn run<R: Request>(
        &self,
        ctx: &RequestContext<R>,
    ) -> Result<Outcome<R::Response>, Fatal> {
        let request = ctx.request_name();
        let Some(handler) = self.provider.resolve::<R>() else {
            warn!(request, "no handler registered");
            return Ok(Outcome::failure(CourierError::NoHandler { request }));
        };

        if tracing::enabled!(Level::DEBUG) {
            debug!(plan = ?self.chain.plan(ctx.capabilities()), "running intercept chain");
        }

        let result = AssertUnwindSafe(self.chain.run(ctx, &*handler))
            .catch_unwind()
            .await;
        settle(request, result)
    }
}

/// Convert a caught chain result into the dispatch result.
fn settle<T>(
    request: &'static str,
    result: Result<HandlerResult<T>, Box<dyn Any + Send>>,
) -> Result<Outcome<T>, Fatal> {
    match result {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(error)) => fault(request, error),
        Err(payload) => {
            let panic = PanicError::from_payload(payload);
            warn!(request, panic = panic.message(), "handler panicked");
            Ok(Outcome::failure(CourierError::Panicked {
                operation: request,
                panic,
            }))
        }
    }
}

fn fault<T>(request: &'static str, error: BoxError) -> Result<Outcome<T>, Fatal> {
    match Fatal::classify(error) {
        Ok(source) => {
            warn!(request, error = %source, "handler failed");
            Ok(Outcome::failure(CourierError::Handler { request, source }))
        }
        Err(fatal) => {
            error!(request, error = %fatal, "fatal error escaped the pipeline");
            Err(fatal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::HNil,
        intercepts,
        registry::Registry,
        testing::{CallLog, RecordingIntercept, StubHandler},
    };
    use courier_core::{Canceled, ErrorKind, FatalKind, Handler, Message};
    use std::error::Error as _;

    struct Ping;
    impl Message for Ping {}
    impl Request for Ping {
        type Response = &'static str;
    }

    struct Faulty;
    impl Message for Faulty {}
    impl Request for Faulty {
        type Response = ();
    }

    #[derive(Debug, thiserror::Error)]
    #[error("database unavailable")]
    struct DbDown;

    struct FaultyHandler;
    impl Handler<Faulty> for FaultyHandler {
        async fn handle(
            &self,
            _request: &Faulty,
            _operation: &OperationContext,
        ) -> HandlerResult<()> {
            Err(Box::new(DbDown))
        }
    }

    struct Cancelling;
    impl Message for Cancelling {}
    impl Request for Cancelling {
        type Response = ();
    }

    struct CancellingHandler;
    impl Handler<Cancelling> for CancellingHandler {
        async fn handle(
            &self,
            _request: &Cancelling,
            operation: &OperationContext,
        ) -> HandlerResult<()> {
            operation.cancellation().cancel();
            operation.cancellation().check()?;
            Ok(Outcome::completed())
        }
    }

    struct Panicky;
    impl Message for Panicky {}
    impl Request for Panicky {
        type Response = ();
    }

    struct PanickyHandler;
    impl Handler<Panicky> for PanickyHandler {
        async fn handle(
            &self,
            _request: &Panicky,
            _operation: &OperationContext,
        ) -> HandlerResult<()> {
            panic!("handler exploded");
        }
    }

    fn registry() -> Registry {
        Registry::builder()
            .handler::<Ping, _>(StubHandler::new("pong"))
            .handler::<Faulty, _>(FaultyHandler)
            .handler::<Cancelling, _>(CancellingHandler)
            .handler::<Panicky, _>(PanickyHandler)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let dispatcher = Dispatcher::new(registry(), HNil);
        let outcome = dispatcher
            .dispatch(Ping, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::success("pong"));
    }

    #[tokio::test]
    async fn test_missing_handler_is_a_failure() {
        struct Orphan;
        impl Message for Orphan {}
        impl Request for Orphan {
            type Response = ();
        }

        let dispatcher = Dispatcher::new(Registry::default(), HNil);
        let outcome = dispatcher
            .dispatch(Orphan, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NoHandler));
        assert_eq!(
            outcome.error().unwrap().to_string(),
            "no handler registered for request `Orphan`"
        );
    }

    #[tokio::test]
    async fn test_non_fatal_error_keeps_original_source() {
        let dispatcher = Dispatcher::new(registry(), HNil);
        let outcome = dispatcher
            .dispatch(Faulty, &CancellationToken::new())
            .await
            .unwrap();

        let error = outcome.error().unwrap();
        assert_eq!(error.kind(), ErrorKind::Handler);
        let source = error.source().unwrap();
        assert!(source.is::<DbDown>());
    }

    #[tokio::test]
    async fn test_cancellation_is_fatal() {
        let dispatcher = Dispatcher::new(registry(), HNil);
        let fatal = dispatcher
            .dispatch(Cancelling, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(fatal.kind(), FatalKind::Canceled);
        assert!(fatal.into_inner().is::<Canceled>());
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let log = CallLog::new();
        let dispatcher = Dispatcher::new(
            registry(),
            intercepts![RecordingIntercept::new("outer", log.clone())],
        );
        let outcome = dispatcher
            .dispatch(Panicky, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Panicked));
        assert!(outcome.error().unwrap().to_string().contains("handler exploded"));
        assert_eq!(log.entries(), vec!["outer:before"]);
    }

    #[tokio::test]
    async fn test_dispatch_with_uses_supplied_context() {
        struct WhoAmI;
        impl Message for WhoAmI {}
        impl Request for WhoAmI {
            type Response = Option<String>;
        }

        struct WhoAmIHandler;
        impl Handler<WhoAmI> for WhoAmIHandler {
            async fn handle(
                &self,
                _request: &WhoAmI,
                operation: &OperationContext,
            ) -> HandlerResult<Option<String>> {
                Ok(Outcome::success(operation.user().id().map(str::to_string)))
            }
        }

        let registry = Registry::builder()
            .handler::<WhoAmI, _>(WhoAmIHandler)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(registry, HNil);
        let operation = OperationContext::builder()
            .user(courier_core::UserIdentity::authenticated("u-7", "Grace"))
            .build();

        let outcome = dispatcher.dispatch_with(WhoAmI, operation).await.unwrap();
        assert_eq!(outcome, Outcome::success(Some("u-7".to_string())));
    }
}

//! Request dispatch through the full facade.

mod common;

use common::{Echo, EchoHandler};
use courier::{
    CancellationToken, CourierError, Dispatcher, ErrorKind, FatalKind, Handler, HandlerResult,
    HNil, Message, OperationContext, Outcome, Registry, Request, UserIdentity, intercepts,
    testing::{CallLog, RecordingIntercept, StubHandler},
};
use std::{error::Error as _, time::Duration};

#[derive(Debug, thiserror::Error)]
#[error("ledger offline")]
struct LedgerOffline;

struct Settle;
impl Message for Settle {}
impl Request for Settle {
    type Response = u64;
}

struct OfflineLedger;
impl Handler<Settle> for OfflineLedger {
    async fn handle(&self, _request: &Settle, _operation: &OperationContext) -> HandlerResult<u64> {
        Err(Box::new(LedgerOffline))
    }
}

struct Allocate;
impl Message for Allocate {}
impl Request for Allocate {
    type Response = usize;
}

struct GreedyHandler;
impl Handler<Allocate> for GreedyHandler {
    async fn handle(
        &self,
        _request: &Allocate,
        _operation: &OperationContext,
    ) -> HandlerResult<usize> {
        let mut buffer = Vec::<u8>::new();
        buffer.try_reserve(usize::MAX)?;
        Ok(Outcome::success(buffer.capacity()))
    }
}

struct Wait;
impl Message for Wait {}
impl Request for Wait {
    type Response = ();
}

struct WaitForCancel;
impl Handler<Wait> for WaitForCancel {
    async fn handle(&self, _request: &Wait, operation: &OperationContext) -> HandlerResult<()> {
        operation.cancellation().canceled().await;
        operation.cancellation().check()?;
        Ok(Outcome::completed())
    }
}

struct Boom;
impl Message for Boom {}
impl Request for Boom {
    type Response = ();
}

struct Exploding;
impl Handler<Boom> for Exploding {
    async fn handle(&self, _request: &Boom, _operation: &OperationContext) -> HandlerResult<()> {
        panic!("exploded while handling");
    }
}

struct WhoAmI;
impl Message for WhoAmI {}
impl Request for WhoAmI {
    type Response = String;
}

struct WhoAmIHandler;
impl Handler<WhoAmI> for WhoAmIHandler {
    async fn handle(
        &self,
        _request: &WhoAmI,
        operation: &OperationContext,
    ) -> HandlerResult<String> {
        Ok(Outcome::success(
            operation.user().name().unwrap_or("anonymous").to_string(),
        ))
    }
}

fn registry() -> Registry {
    Registry::builder()
        .handler::<Echo, _>(EchoHandler)
        .handler::<Settle, _>(OfflineLedger)
        .handler::<Allocate, _>(GreedyHandler)
        .handler::<Wait, _>(WaitForCancel)
        .handler::<Boom, _>(Exploding)
        .handler::<WhoAmI, _>(WhoAmIHandler)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_intercepts_wrap_the_handler_in_order() {
    let log = CallLog::new();
    let registry = Registry::builder()
        .handler::<Echo, _>(StubHandler::new("pong".to_string()).with_log(log.clone()))
        .build()
        .unwrap();
    let dispatcher = Dispatcher::new(
        registry,
        intercepts![
            RecordingIntercept::new("outer", log.clone()),
            RecordingIntercept::new("inner", log.clone()),
        ],
    );

    let outcome = dispatcher
        .dispatch(Echo { text: "ping".into() }, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::success("pong".to_string()));
    assert_eq!(
        log.entries(),
        vec!["outer:before", "inner:before", "handler", "inner:after", "outer:after"]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_the_handler() {
    let log = CallLog::new();
    let handler = StubHandler::new("pong".to_string()).with_log(log.clone());
    let registry = Registry::builder()
        .handler::<Echo, _>(handler.clone())
        .build()
        .unwrap();
    let dispatcher = Dispatcher::new(
        registry,
        intercepts![
            RecordingIntercept::new("outer", log.clone()),
            RecordingIntercept::short_circuit("gate", log.clone()),
            RecordingIntercept::new("inner", log.clone()),
        ],
    );

    let outcome = dispatcher
        .dispatch(Echo { text: "ping".into() }, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::fail("short-circuited by gate"));
    assert!(!handler.was_called());
    assert_eq!(
        log.entries(),
        vec!["outer:before", "gate:before", "gate:short", "outer:after"]
    );
}

#[tokio::test]
async fn test_missing_handler_is_a_failure() {
    let dispatcher = Dispatcher::new(Registry::default(), HNil);

    let outcome = dispatcher
        .dispatch(Echo { text: "ping".into() }, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.error_kind(), Some(ErrorKind::NoHandler));
    assert_eq!(
        outcome.error().unwrap().to_string(),
        "no handler registered for request `Echo`"
    );
}

#[tokio::test]
async fn test_handler_errors_become_failures_with_their_source() {
    let dispatcher = Dispatcher::new(registry(), HNil);

    let outcome = dispatcher
        .dispatch(Settle, &CancellationToken::new())
        .await
        .unwrap();

    let error = outcome.error().unwrap();
    assert!(matches!(&**error, CourierError::Handler { request: "Settle", .. }));
    assert!(error.source().unwrap().is::<LedgerOffline>());
}

#[tokio::test]
async fn test_allocation_failure_escapes_as_fatal() {
    let dispatcher = Dispatcher::new(registry(), HNil);

    let fatal = dispatcher
        .dispatch(Allocate, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(fatal.kind(), FatalKind::ResourceExhausted);
    assert!(fatal.get_ref().is::<std::collections::TryReserveError>());
}

#[tokio::test]
async fn test_cancellation_during_the_handler_escapes_as_fatal() {
    let dispatcher = Dispatcher::new(registry(), HNil);
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        }
    };
    let (result, ()) = tokio::join!(dispatcher.dispatch(Wait, &token), canceller);

    let fatal = result.unwrap_err();
    assert!(fatal.is_canceled());
}

#[tokio::test]
async fn test_panics_become_failures() {
    let dispatcher = Dispatcher::new(registry(), HNil);

    let outcome = dispatcher
        .dispatch(Boom, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Panicked));
    assert!(outcome.error().unwrap().to_string().contains("exploded while handling"));
}

#[tokio::test]
async fn test_dispatch_with_carries_the_user() {
    let dispatcher = Dispatcher::new(registry(), HNil);
    let operation = OperationContext::builder()
        .user(UserIdentity::authenticated("u-1", "ada"))
        .build();

    let outcome = dispatcher.dispatch_with(WhoAmI, operation).await.unwrap();

    assert_eq!(outcome, Outcome::success("ada".to_string()));
}

use courier_core::{
    AuditRecord, AuditSink, Capabilities, HandlerResult, Intercept, Next, OutcomeStatus, Request,
    RequestContext,
};
use std::time::Instant;

/// Records an [`AuditRecord`] for every auditable request.
///
/// Applies to requests declaring [`Capabilities::AUDITABLE`]. The record is
/// emitted after the inner chain finishes, whatever its result; the result
/// itself is passed through untouched.
#[derive(Debug, Clone, Default)]
pub struct Audit<S> {
    sink: S,
}

impl<S> Audit<S> {
    /// Send audit records to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: AuditSink> Intercept for Audit<S> {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn applies_to(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::AUDITABLE)
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let started = Instant::now();
        let result = next.run().await;
        let status = match &result {
            Ok(outcome) => outcome.status(),
            Err(_) => OutcomeStatus::Fault,
        };
        let operation = ctx.operation();
        self.sink
            .record(AuditRecord {
                request: ctx.request_name(),
                correlation_id: operation.correlation_id(),
                user_id: operation.user().id().map(str::to_string),
                status,
                elapsed: started.elapsed(),
                timestamp: operation.timestamp(),
            })
            .await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::InterceptChain,
        intercepts,
        testing::{RecordingAuditSink, StubHandler},
    };
    use courier_core::{Message, OperationContext, Outcome, UserIdentity};

    struct Transfer;
    impl Message for Transfer {}
    impl Request for Transfer {
        type Response = ();
        const CAPABILITIES: Capabilities = Capabilities::AUDITABLE;
    }

    struct Lookup;
    impl Message for Lookup {}
    impl Request for Lookup {
        type Response = ();
    }

    #[tokio::test]
    async fn test_auditable_request_is_recorded() {
        let sink = RecordingAuditSink::new();
        let chain = intercepts![Audit::new(sink.clone())];
        let operation = OperationContext::builder()
            .user(UserIdentity::authenticated("u-1", "Ada"))
            .build();
        let correlation_id = operation.correlation_id();

        let outcome = chain
            .run(&RequestContext::new(Transfer, operation), &StubHandler::new(()))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::completed());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request, "Transfer");
        assert_eq!(records[0].correlation_id, correlation_id);
        assert_eq!(records[0].user_id.as_deref(), Some("u-1"));
        assert_eq!(records[0].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn test_other_requests_are_not_recorded() {
        let sink = RecordingAuditSink::new();
        let chain = intercepts![Audit::new(sink.clone())];

        chain
            .run(
                &RequestContext::new(Lookup, OperationContext::default()),
                &StubHandler::new(()),
            )
            .await
            .unwrap();

        assert!(sink.records().is_empty());
    }
}

//! Default sinks that forward to `tracing`.
//!
//! Both sinks emit events under the `courier` target, so hosts can route
//! them with an ordinary `tracing` subscriber filter.

use courier_core::{AuditRecord, AuditSink, OutcomeStatus, TelemetrySink};
use std::time::Duration;

/// Emits one `debug` event per timed request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record_duration(&self, operation: &str, elapsed: Duration, status: OutcomeStatus) {
        tracing::debug!(
            target: "courier::telemetry",
            operation,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            %status,
            "request timed"
        );
    }
}

/// Emits one `info` event per audited request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "courier::audit",
            request = record.request,
            correlation_id = %record.correlation_id,
            user_id = record.user_id.as_deref().unwrap_or("anonymous"),
            status = %record.status,
            elapsed_us = u64::try_from(record.elapsed.as_micros()).unwrap_or(u64::MAX),
            timestamp = %record.timestamp,
            "request audited"
        );
    }
}

use courier_core::{
    CourierError, ErrorKind, HandlerResult, Intercept, Next, Outcome, Request, RequestContext,
    ValidationFailure, Validator,
};
use std::sync::Arc;
use tracing::debug;

/// Rejects invalid requests before they reach the handler.
///
/// A failed validation short-circuits: inner intercepts and the handler
/// never run. A rejection reported as some other failure is re-tagged as a
/// [`CourierError::Validation`] on the `request` field, keeping its message.
#[derive(Debug, Clone, Default)]
pub struct Validation<V> {
    validator: V,
}

impl<V> Validation<V> {
    /// Validate requests with `validator`.
    pub fn new(validator: V) -> Self {
        Self { validator }
    }

    /// The wrapped validator.
    pub fn validator(&self) -> &V {
        &self.validator
    }
}

impl<V: Validator> Intercept for Validation<V> {
    fn name(&self) -> &'static str {
        "validation"
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let Outcome::Failure(error) = self.validator.validate(ctx.request()).await else {
            return next.run().await;
        };
        debug!(request = ctx.request_name(), %error, "request rejected by validation");
        let error = if error.kind() == ErrorKind::Validation {
            error
        } else {
            Arc::new(CourierError::Validation(
                ValidationFailure::new().field("request", error.to_string()),
            ))
        };
        Ok(Outcome::Failure(error))
    }
}

use courier_core::{
    AuthorizationEvaluator, Capabilities, CourierError, ErrorKind, HandlerResult, Intercept,
    Next, OperationContext, Outcome, Request, RequestContext, Resource,
};
use std::sync::Arc;
use tracing::debug;

/// Checks that the current principal may act on the request's resource.
///
/// Applies to requests declaring [`Capabilities::AUTHORIZABLE`]. The
/// evaluator is consulted with [`Request::resource`] and the operation
/// context; a denial short-circuits with [`CourierError::Forbidden`]. A
/// denial reported as some other failure is re-tagged as forbidden, keeping
/// its message as the reason.
#[derive(Debug, Clone, Default)]
pub struct Authorization<A> {
    evaluator: A,
}

impl<A> Authorization<A> {
    /// Authorize requests with `evaluator`.
    pub fn new(evaluator: A) -> Self {
        Self { evaluator }
    }
}

impl<A: AuthorizationEvaluator> Intercept for Authorization<A> {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn applies_to(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::AUTHORIZABLE)
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let resource = ctx.request().resource();
        match self.evaluator.evaluate(&resource, ctx.operation()).await {
            Outcome::Success(()) => next.run().await,
            Outcome::Failure(error) => {
                debug!(request = ctx.request_name(), %resource, %error, "access denied");
                let error = if error.kind() == ErrorKind::Forbidden {
                    error
                } else {
                    Arc::new(CourierError::forbidden(resource, error.to_string()))
                };
                Ok(Outcome::Failure(error))
            }
        }
    }
}

/// Allows authenticated principals only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthenticated;

impl AuthorizationEvaluator for RequireAuthenticated {
    async fn evaluate(&self, resource: &Resource, operation: &OperationContext) -> Outcome {
        if operation.user().is_authenticated() {
            Outcome::completed()
        } else {
            Outcome::failure(CourierError::forbidden(
                resource.clone(),
                "authentication required",
            ))
        }
    }
}

/// Allows principals holding a given role.
#[derive(Debug, Clone)]
pub struct RequireRole {
    role: String,
}

impl RequireRole {
    /// Require `role`.
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl AuthorizationEvaluator for RequireRole {
    async fn evaluate(&self, resource: &Resource, operation: &OperationContext) -> Outcome {
        if operation.user().has_role(&self.role) {
            Outcome::completed()
        } else {
            Outcome::failure(CourierError::forbidden(
                resource.clone(),
                format!("role `{}` required", self.role),
            ))
        }
    }
}

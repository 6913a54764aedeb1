//! Static intercept chains.
//!
//! A chain is an HList of intercepts ending in [`HNil`], which invokes the
//! resolved handler. The whole chain is a single concrete type, so every
//! intercept call is statically dispatched; only the hand-off through
//! [`Next`] is type-erased.
//!
//! The first intercept of the list is the outermost: it runs first on the
//! way in and last on the way out.

use courier_core::{
    Capabilities, Continuation, DynHandler, HandlerResult, Intercept, Next, Request,
    RequestContext,
};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};

/// HList terminator: invokes the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct HNil;

/// HList cons cell: an intercept wrapping the rest of the chain.
#[derive(Debug, Clone, Default)]
pub struct HCons<H, T> {
    /// The outer intercept.
    pub head: H,
    /// The remainder of the chain.
    pub tail: T,
}

/// Trait for running a request through a composed chain of intercepts.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an intercept chain",
    label = "expected `HCons`/`HNil` built from `Intercept`s",
    note = "Build chains with `ChainBuilder` or the `intercepts!` macro."
)]
pub trait InterceptChain: Send + Sync + 'static {
    /// Run `ctx` through the chain, ending at `handler`.
    fn run<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        handler: &dyn DynHandler<R>,
    ) -> impl Future<Output = HandlerResult<R::Response>> + Send;

    /// Append the names of intercepts applying to `capabilities`, outermost first.
    fn collect_plan(&self, capabilities: Capabilities, plan: &mut Vec<&'static str>);

    /// Names of the intercepts that run for a request with `capabilities`.
    fn plan(&self, capabilities: Capabilities) -> Vec<&'static str> {
        let mut plan = Vec::new();
        self.collect_plan(capabilities, &mut plan);
        plan
    }
}

impl InterceptChain for HNil {
    async fn run<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        handler: &dyn DynHandler<R>,
    ) -> HandlerResult<R::Response> {
        handler.handle_dyn(ctx.request(), ctx.operation()).await
    }

    fn collect_plan(&self, _capabilities: Capabilities, _plan: &mut Vec<&'static str>) {}
}

impl<H, T> InterceptChain for HCons<H, T>
where
    H: Intercept,
    T: InterceptChain,
{
    async fn run<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        handler: &dyn DynHandler<R>,
    ) -> HandlerResult<R::Response> {
        if !self.head.applies_to(R::CAPABILITIES) {
            return self.tail.run(ctx, handler).await;
        }
        let rest = Rest {
            chain: &self.tail,
            handler,
        };
        self.head.intercept(ctx, Next::new(ctx, &rest)).await
    }

    fn collect_plan(&self, capabilities: Capabilities, plan: &mut Vec<&'static str>) {
        if self.head.applies_to(capabilities) {
            plan.push(self.head.name());
        }
        self.tail.collect_plan(capabilities, plan);
    }
}

impl<C: InterceptChain> InterceptChain for Arc<C> {
    fn run<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        handler: &dyn DynHandler<R>,
    ) -> impl Future<Output = HandlerResult<R::Response>> + Send {
        (**self).run(ctx, handler)
    }

    fn collect_plan(&self, capabilities: Capabilities, plan: &mut Vec<&'static str>) {
        (**self).collect_plan(capabilities, plan);
    }
}

/// The tail of a chain plus its handler, handed to an intercept as [`Next`].
struct Rest<'a, T, R: Request> {
    chain: &'a T,
    handler: &'a dyn DynHandler<R>,
}

impl<T: InterceptChain, R: Request> Continuation<R> for Rest<'_, T, R> {
    fn proceed<'b>(
        &'b self,
        ctx: &'b RequestContext<R>,
    ) -> BoxFuture<'b, HandlerResult<R::Response>> {
        Box::pin(self.chain.run(ctx, self.handler))
    }
}

// ============================================================================
// Append
// ============================================================================

/// Type-level append of an intercept at the innermost position.
pub trait Append<I> {
    /// The chain with `I` appended.
    type Output;

    /// Append `item` just before the handler.
    fn append(self, item: I) -> Self::Output;
}

impl<I> Append<I> for HNil {
    type Output = HCons<I, HNil>;

    fn append(self, item: I) -> Self::Output {
        HCons {
            head: item,
            tail: HNil,
        }
    }
}

impl<H, T: Append<I>, I> Append<I> for HCons<H, T> {
    type Output = HCons<H, T::Output>;

    fn append(self, item: I) -> Self::Output {
        HCons {
            head: self.head,
            tail: self.tail.append(item),
        }
    }
}

// ============================================================================
// Builder pattern
// ============================================================================

/// Builder for constructing intercept chains in registration order.
///
/// ```rust,ignore
/// let chain = ChainBuilder::new()
///     .with(Validation::new(validators))   // outermost
///     .with(Performance::new(telemetry))   // innermost
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ChainBuilder<T> {
    chain: T,
}

impl ChainBuilder<HNil> {
    /// Create a new empty chain builder.
    pub fn new() -> Self {
        Self { chain: HNil }
    }
}

impl Default for ChainBuilder<HNil> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChainBuilder<T> {
    /// Register an intercept inside every intercept registered so far.
    pub fn with<I: Intercept>(self, intercept: I) -> ChainBuilder<T::Output>
    where
        T: Append<I>,
    {
        ChainBuilder {
            chain: self.chain.append(intercept),
        }
    }

    /// Register an intercept outside every intercept registered so far.
    pub fn prepend<I: Intercept>(self, intercept: I) -> ChainBuilder<HCons<I, T>> {
        ChainBuilder {
            chain: HCons {
                head: intercept,
                tail: self.chain,
            },
        }
    }

    /// Finalize and return the built chain.
    pub fn build(self) -> T {
        self.chain
    }
}

// ============================================================================
// HList Length
// ============================================================================

/// Trait for computing chain length at compile time.
pub trait HListLen {
    /// The number of intercepts in the chain.
    const LEN: usize;
}

impl HListLen for HNil {
    const LEN: usize = 0;
}

impl<H, T: HListLen> HListLen for HCons<H, T> {
    const LEN: usize = 1 + T::LEN;
}

// ============================================================================
// Macro
// ============================================================================

/// Construct an intercept chain; the first intercept is the outermost.
///
/// # Example
/// ```ignore
/// let chain = intercepts![Validation::new(v), Performance::new(t)];
/// ```
#[macro_export]
macro_rules! intercepts {
    () => { $crate::chain::HNil };
    ($intercept:expr $(,)?) => {
        $crate::chain::HCons {
            head: $intercept,
            tail: $crate::chain::HNil,
        }
    };
    ($intercept:expr, $($rest:expr),+ $(,)?) => {
        $crate::chain::HCons {
            head: $intercept,
            tail: $crate::intercepts!($($rest),+),
        }
    };
}

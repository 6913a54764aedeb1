//! The standard intercept chain.
//!
//! [`standard_chain`] assembles the built-in intercepts in their standard
//! order from a [`PipelineConfig`]. Each one is wrapped in [`Conditional`],
//! so the configuration's toggles decide the initial state and the host can
//! still switch them at runtime.

use crate::{
    chain::{HCons, HNil},
    config::{ConfigError, PipelineConfig},
    intercepts,
    intercepts::{Audit, Authorization, Caching, Conditional, Performance, Validation},
};
use courier_core::{AuditSink, AuthorizationEvaluator, ResponseCache, TelemetrySink, Validator};

/// Collaborators of the built-in intercepts.
#[derive(Debug, Clone, Default)]
pub struct StandardParts<V, S, A, T, C> {
    /// Used by [`Validation`].
    pub validator: V,
    /// Used by [`Audit`].
    pub audit: S,
    /// Used by [`Authorization`].
    pub evaluator: A,
    /// Used by [`Performance`].
    pub telemetry: T,
    /// Used by [`Caching`].
    pub cache: C,
}

/// Validation → Audit → Authorization → Performance → Caching.
pub type StandardChain<V, S, A, T, C> = HCons<
    Conditional<Validation<V>>,
    HCons<
        Conditional<Audit<S>>,
        HCons<
            Conditional<Authorization<A>>,
            HCons<Conditional<Performance<T>>, HCons<Conditional<Caching<C>>, HNil>>,
        >,
    >,
>;

/// Build the standard chain from `config`.
///
/// # Errors
///
/// Returns the first problem [`PipelineConfig::validate`] finds.
pub fn standard_chain<V, S, A, T, C>(
    config: &PipelineConfig,
    parts: StandardParts<V, S, A, T, C>,
) -> Result<StandardChain<V, S, A, T, C>, ConfigError>
where
    V: Validator,
    S: AuditSink,
    A: AuthorizationEvaluator,
    T: TelemetrySink,
    C: ResponseCache,
{
    config.validate()?;
    let toggles = config.intercepts;

    let mut performance = Performance::new(parts.telemetry);
    if let Some(threshold) = config.performance.slow_threshold() {
        performance = performance.with_slow_threshold(threshold);
    }
    let caching =
        Caching::new(parts.cache).with_default_expiration(config.cache.default_expiration());

    Ok(intercepts![
        Conditional::new(Validation::new(parts.validator), toggles.validation),
        Conditional::new(Audit::new(parts.audit), toggles.audit),
        Conditional::new(Authorization::new(parts.evaluator), toggles.authorization),
        Conditional::new(performance, toggles.performance),
        Conditional::new(caching, toggles.caching),
    ])
}

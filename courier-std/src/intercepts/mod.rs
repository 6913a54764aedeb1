//! Built-in intercepts.
//!
//! The standard order, outermost first, is
//! [`Validation`] → [`Audit`] → [`Authorization`] → [`Performance`] → [`Caching`]:
//! invalid requests are rejected before anything is recorded, denied
//! requests are audited but never timed, and cache hits are still timed.
//!
//! [`Conditional`] switches any intercept on or off at runtime, and
//! [`Recover`] converts escaped errors and panics into failed outcomes.

mod audit;
mod authorization;
mod caching;
mod conditional;
mod performance;
mod recover;
mod validation;

pub use audit::Audit;
pub use authorization::{Authorization, RequireAuthenticated, RequireRole};
pub use caching::{Caching, DEFAULT_CACHE_EXPIRATION};
pub use conditional::Conditional;
pub use performance::Performance;
pub use recover::Recover;
pub use validation::Validation;

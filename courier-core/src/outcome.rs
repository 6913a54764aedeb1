//! # Outcome
//!
//! [`Outcome<T>`] is the value every handler, intercept, dispatch and publish
//! produces: either `Success(T)` or `Failure` carrying a shared
//! [`CourierError`]. Failures are cheap to pass along; the combinators
//! forward the same `Arc` instead of rebuilding the error.
//!
//! # Panics in combinators
//!
//! [`map`](Outcome::map) and [`then`](Outcome::then) catch a panic raised by
//! their closure and turn it into a [`CourierError::Panicked`] failure.
//! [`on_success`](Outcome::on_success) and [`on_failure`](Outcome::on_failure)
//! do not: a panic inside those hooks unwinds into the caller.

use crate::error::{CourierError, ErrorKind, PanicError};
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

/// Coarse status of a finished pipeline step, as reported to sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// The step produced a success.
    Success,
    /// The step produced a failure outcome.
    Failure,
    /// An error or panic escaped the step.
    Fault,
}

impl OutcomeStatus {
    /// Stable lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failure => "failure",
            OutcomeStatus::Fault => "fault",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of a request or a publish.
///
/// `Outcome<()>` is the non-generic form; any outcome converts to it with
/// [`discard`](Self::discard).
#[derive(Debug, Clone)]
#[must_use = "an Outcome may be a failure that should be inspected"]
pub enum Outcome<T = ()> {
    /// The operation succeeded with a value.
    Success(T),
    /// The operation failed.
    Failure(Arc<CourierError>),
}

impl<T> Outcome<T> {
    /// A successful outcome.
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// A failed outcome.
    pub fn failure(error: impl Into<Arc<CourierError>>) -> Self {
        Outcome::Failure(error.into())
    }

    /// A failed outcome carrying a plain message.
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Failure(Arc::new(CourierError::Message(message.into())))
    }

    /// Whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure's error, if any.
    pub fn error(&self) -> Option<&Arc<CourierError>> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// The failure's error kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|error| error.kind())
    }

    /// Consume and return the success value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<T, Arc<CourierError>> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }

    /// Success or failure status.
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Outcome::Success(_) => OutcomeStatus::Success,
            Outcome::Failure(_) => OutcomeStatus::Failure,
        }
    }

    /// Drop the value, keeping only success or failure.
    pub fn discard(self) -> Outcome {
        match self {
            Outcome::Success(_) => Outcome::Success(()),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Transform the success value.
    ///
    /// A panic inside `f` becomes a [`CourierError::Panicked`] failure. A
    /// failure is returned unchanged and `f` is not called.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => match catch_unwind(AssertUnwindSafe(|| f(value))) {
                Ok(mapped) => Outcome::Success(mapped),
                Err(payload) => Outcome::Failure(panicked("Outcome::map", payload)),
            },
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Chain an operation that itself produces an outcome.
    ///
    /// Panics inside `f` are captured as in [`map`](Self::map).
    pub fn then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => match catch_unwind(AssertUnwindSafe(|| f(value))) {
                Ok(next) => next,
                Err(payload) => Outcome::Failure(panicked("Outcome::then", payload)),
            },
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Turn a success whose value fails `predicate` into a failure.
    pub fn filter(
        self,
        predicate: impl FnOnce(&T) -> bool,
        error: impl FnOnce(&T) -> CourierError,
    ) -> Self {
        match self {
            Outcome::Success(value) => {
                if predicate(&value) {
                    Outcome::Success(value)
                } else {
                    Outcome::Failure(Arc::new(error(&value)))
                }
            }
            failure => failure,
        }
    }

    /// Run `action` on the success value and return the outcome unchanged.
    ///
    /// # Panics
    ///
    /// A panic inside `action` propagates to the caller. Use
    /// [`map`](Self::map) to capture it as a failure instead.
    pub fn on_success(self, action: impl FnOnce(&T)) -> Self {
        if let Outcome::Success(value) = &self {
            action(value);
        }
        self
    }

    /// Run `action` on the failure's error and return the outcome unchanged.
    ///
    /// # Panics
    ///
    /// A panic inside `action` propagates to the caller.
    pub fn on_failure(self, action: impl FnOnce(&CourierError)) -> Self {
        if let Outcome::Failure(error) = &self {
            action(error);
        }
        self
    }
}

impl Outcome {
    /// A successful outcome without a value.
    pub fn completed() -> Self {
        Outcome::Success(())
    }
}

fn panicked(operation: &'static str, payload: Box<dyn std::any::Any + Send>) -> Arc<CourierError> {
    Arc::new(CourierError::Panicked {
        operation,
        panic: PanicError::from_payload(payload),
    })
}

impl<T, E: Into<CourierError>> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(Arc::new(error.into())),
        }
    }
}

impl<T: PartialEq> PartialEq for Outcome<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Success(a), Outcome::Success(b)) => a == b,
            (Outcome::Failure(a), Outcome::Failure(b)) => {
                Arc::ptr_eq(a, b) || (a.kind() == b.kind() && a.to_string() == b.to_string())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_map_transforms_success() {
        let outcome = Outcome::success(20).map(|v| v + 1);
        assert_eq!(outcome, Outcome::success(21));
    }

    #[test]
    fn test_map_on_failure_keeps_same_error_and_skips_closure() {
        let failure: Outcome<i32> = Outcome::fail("nope");
        let original = Arc::clone(failure.error().unwrap());
        let called = Cell::new(false);

        let mapped = failure.map(|v| {
            called.set(true);
            v * 2
        });

        assert!(!called.get());
        assert!(Arc::ptr_eq(mapped.error().unwrap(), &original));
    }

    #[test]
    fn test_then_on_failure_keeps_same_error_and_skips_closure() {
        let failure: Outcome<i32> = Outcome::fail("nope");
        let original = Arc::clone(failure.error().unwrap());
        let called = Cell::new(false);

        let chained = failure.then(|v| {
            called.set(true);
            Outcome::success(v.to_string())
        });

        assert!(!called.get());
        assert!(Arc::ptr_eq(chained.error().unwrap(), &original));
    }

    #[test]
    fn test_map_captures_panic() {
        let outcome: Outcome<i32> = Outcome::success(1).map(|_| panic!("bad map"));
        let error = outcome.error().unwrap();
        assert_eq!(error.kind(), ErrorKind::Panicked);
        assert!(error.to_string().contains("bad map"));
    }

    #[test]
    fn test_then_captures_panic() {
        let outcome: Outcome<i32> = Outcome::success(1).then(|_| panic!("bad bind"));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Panicked));
    }

    #[test]
    fn test_then_propagates_inner_failure() {
        let outcome: Outcome<i32> = Outcome::success(1).then(|_| Outcome::fail("inner"));
        assert_eq!(outcome, Outcome::fail("inner"));
    }

    #[test]
    fn test_filter() {
        let kept = Outcome::success(4).filter(|v| v % 2 == 0, |_| "odd".into());
        assert_eq!(kept, Outcome::success(4));

        let rejected = Outcome::success(3).filter(|v| v % 2 == 0, |v| format!("{v} is odd").into());
        assert_eq!(rejected.error().unwrap().to_string(), "3 is odd");
    }

    #[test]
    fn test_hooks_return_original_outcome() {
        let seen = Cell::new(0);
        let outcome = Outcome::success(5)
            .on_success(|v| seen.set(*v))
            .on_failure(|_| seen.set(-1));
        assert_eq!(seen.get(), 5);
        assert_eq!(outcome, Outcome::success(5));

        let failure: Outcome<i32> = Outcome::fail("x").on_failure(|e| {
            assert_eq!(e.kind(), ErrorKind::Message);
        });
        assert!(failure.is_failure());
    }

    #[test]
    #[should_panic(expected = "hook panicked")]
    fn test_on_success_panic_propagates() {
        let _ = Outcome::success(1).on_success(|_| panic!("hook panicked"));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Outcome::<()>::fail("a"), Outcome::<()>::fail("a"));
        assert_ne!(Outcome::<()>::fail("a"), Outcome::<()>::fail("b"));
        assert_ne!(Outcome::success(1), Outcome::fail("1"));
        assert_ne!(
            Outcome::<()>::fail("no handler registered for request `X`"),
            Outcome::failure(CourierError::NoHandler { request: "X" })
        );
    }

    #[test]
    fn test_from_result_and_into_result() {
        let ok: Outcome<u8> = Ok::<_, CourierError>(1).into();
        assert_eq!(ok.into_result().unwrap(), 1);

        let err: Outcome<u8> = Err::<u8, _>("broken").into();
        assert_eq!(err.status(), OutcomeStatus::Failure);
        assert_eq!(err.into_result().unwrap_err().to_string(), "broken");
    }

    #[test]
    fn test_discard_keeps_failure() {
        let failure: Outcome<String> = Outcome::fail("gone");
        let original = Arc::clone(failure.error().unwrap());
        let discarded = failure.discard();
        assert!(Arc::ptr_eq(discarded.error().unwrap(), &original));
        assert_eq!(Outcome::success("v").discard(), Outcome::completed());
    }
}

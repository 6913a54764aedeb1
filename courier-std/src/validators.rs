//! Per-request-type validators.
//!
//! [`ValidatorRegistry`] collects synchronous [`RequestValidator`]s keyed by
//! request type and implements [`Validator`] by running every validator
//! registered for the request and merging their field errors.

use courier_core::{CourierError, Outcome, Request, ValidationFailure, Validator};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

/// Checks one request type.
pub trait RequestValidator<R: Request>: Send + Sync + 'static {
    /// `Err` with every field error found.
    fn validate(&self, request: &R) -> Result<(), ValidationFailure>;
}

impl<R, F> RequestValidator<R> for F
where
    R: Request,
    F: Fn(&R) -> Result<(), ValidationFailure> + Send + Sync + 'static,
{
    fn validate(&self, request: &R) -> Result<(), ValidationFailure> {
        self(request)
    }
}

type Validators<R> = Vec<Box<dyn RequestValidator<R>>>;

/// Validators for any number of request types.
///
/// Request types without validators always pass.
///
/// # Example
///
/// ```rust,ignore
/// let validators = ValidatorRegistry::new()
///     .register::<CreateUser, _>(|request: &CreateUser| {
///         if request.name.is_empty() {
///             Err(ValidationFailure::new().field("name", "must not be empty"))
///         } else {
///             Ok(())
///         }
///     });
/// ```
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator for `R`. Validators of one type run in registration order.
    pub fn register<R: Request, V: RequestValidator<R>>(mut self, validator: V) -> Self {
        let list = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Validators::<R>::new()));
        if let Some(list) = list.downcast_mut::<Validators<R>>() {
            list.push(Box::new(validator));
        }
        self
    }

    /// Number of validators registered for `R`.
    pub fn count<R: Request>(&self) -> usize {
        self.list::<R>().map_or(0, Vec::len)
    }

    fn list<R: Request>(&self) -> Option<&Validators<R>> {
        self.validators
            .get(&TypeId::of::<R>())
            .and_then(|list| list.downcast_ref::<Validators<R>>())
    }

    /// Run every validator for `R` and merge their errors.
    pub fn check<R: Request>(&self, request: &R) -> Result<(), ValidationFailure> {
        let mut failure = ValidationFailure::new();
        for validator in self.list::<R>().into_iter().flatten() {
            if let Err(errors) = validator.validate(request) {
                failure.merge(errors);
            }
        }
        if failure.is_empty() {
            Ok(())
        } else {
            Err(failure)
        }
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("request_types", &self.validators.len())
            .finish()
    }
}

impl Validator for ValidatorRegistry {
    async fn validate<R: Request>(&self, request: &R) -> Outcome {
        match self.check(request) {
            Ok(()) => Outcome::completed(),
            Err(failure) => Outcome::failure(CourierError::Validation(failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::Message;

    struct Signup {
        email: String,
        age: u8,
    }
    impl Message for Signup {}
    impl Request for Signup {
        type Response = ();
    }

    struct AgeCheck;
    impl RequestValidator<Signup> for AgeCheck {
        fn validate(&self, request: &Signup) -> Result<(), ValidationFailure> {
            if request.age < 18 {
                return Err(ValidationFailure::new().field("age", "must be at least 18"));
            }
            Ok(())
        }
    }

    fn registry() -> ValidatorRegistry {
        ValidatorRegistry::new()
            .register::<Signup, _>(|request: &Signup| {
                if request.email.contains('@') {
                    Ok(())
                } else {
                    Err(ValidationFailure::new().field("email", "must contain @"))
                }
            })
            .register::<Signup, _>(AgeCheck)
    }

    #[test]
    fn test_errors_from_all_validators_are_merged() {
        let failure = registry()
            .check(&Signup {
                email: "nope".into(),
                age: 12,
            })
            .unwrap_err();
        let fields: Vec<_> = failure.errors().iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["email", "age"]);
    }

    #[tokio::test]
    async fn test_validator_outcome() {
        let registry = registry();
        assert_eq!(registry.count::<Signup>(), 2);

        let ok = registry
            .validate(&Signup {
                email: "a@b.c".into(),
                age: 30,
            })
            .await;
        assert!(ok.is_success());

        let rejected = registry
            .validate(&Signup {
                email: "a@b.c".into(),
                age: 3,
            })
            .await;
        assert_eq!(
            rejected.error().unwrap().to_string(),
            "validation failed: age: must be at least 18"
        );
    }

    #[tokio::test]
    async fn test_types_without_validators_pass() {
        struct Unchecked;
        impl Message for Unchecked {}
        impl Request for Unchecked {
            type Response = ();
        }

        assert!(registry().validate(&Unchecked).await.is_success());
    }
}

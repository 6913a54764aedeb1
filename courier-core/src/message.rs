//! Message, request and notification traits.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, str::FromStr, time::Duration};

/// A marker trait for every value that travels through Courier.
///
/// Messages must be `Send + Sync + 'static` to be safe for async use.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct UserCreated { id: u64 }
///
/// impl Message for UserCreated {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "All requests and notifications in Courier must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

// Common Message implementations
impl Message for () {}
impl Message for String {}
impl Message for &'static str {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for std::sync::Arc<T> {}
impl<T: Message> Message for Vec<T> {}
impl<T: Message> Message for Option<T> {}

bitflags! {
    /// Cross-cutting capabilities a request type opts into.
    ///
    /// Intercepts consult these flags to decide whether they apply to a
    /// request type. The set is static per type (see [`Request::CAPABILITIES`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// The request is recorded by audit intercepts.
        const AUDITABLE = 1;
        /// The request must pass an authorization check.
        const AUTHORIZABLE = 1 << 1;
        /// Successful responses may be served from a cache.
        const CACHEABLE = 1 << 2;
    }
}

/// A value representing a single unit of work with at most one logical response.
///
/// Void-shaped requests use `()` as their response.
///
/// # Capabilities
///
/// A request declares its cross-cutting capabilities through
/// [`Request::CAPABILITIES`] and, where a capability needs data, overrides
/// the matching accessor:
///
/// - [`Capabilities::AUTHORIZABLE`] → [`Request::resource`]
/// - [`Capabilities::CACHEABLE`] → [`Request::cache_key`], [`Request::cache_expiration`]
///
/// # Example
///
/// ```rust,ignore
/// struct GetUser { id: u64 }
/// impl Message for GetUser {}
///
/// impl Request for GetUser {
///     type Response = User;
///     const CAPABILITIES: Capabilities = Capabilities::CACHEABLE;
///
///     fn cache_key(&self) -> Option<String> {
///         Some(self.id.to_string())
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Request",
    label = "missing `Request` implementation",
    note = "Implement `Request` (or derive it) and declare the `Response` type."
)]
pub trait Request: Message {
    /// The response produced by the request's handler.
    type Response: Clone + Send + Sync + 'static;

    /// Static capability set of this request type.
    const CAPABILITIES: Capabilities = Capabilities::empty();

    /// The resource an authorization check is evaluated against.
    fn resource(&self) -> Resource {
        Resource::of::<Self>()
    }

    /// Cache key for this request instance. `None` bypasses caching.
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// Expiration for a cached response. `None` uses the configured default.
    fn cache_expiration(&self) -> Option<Duration> {
        None
    }
}

/// A value representing a fact broadcast to zero or more subscribers.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Notification",
    label = "missing `Notification` implementation",
    note = "Implement `Notification` (or derive it) to publish `{Self}`."
)]
pub trait Notification: Message {
    /// Strategy declared on the type. `None` uses the configured default.
    const STRATEGY: Option<FanOut> = None;
}

/// The fan-out strategy used when publishing a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// One at a time in registration order; failures are collected.
    #[default]
    Sequential,
    /// One at a time in registration order; stops at the first failure.
    FailFast,
    /// All concurrently; failures are collected.
    Parallel,
    /// All on detached tasks; the caller never observes failures.
    FireAndForget,
}

impl FanOut {
    /// Stable lowercase name, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FanOut::Sequential => "sequential",
            FanOut::FailFast => "fail_fast",
            FanOut::Parallel => "parallel",
            FanOut::FireAndForget => "fire_and_forget",
        }
    }
}

impl fmt::Display for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanOut {
    type Err = UnknownFanOut;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "sequential" => Ok(FanOut::Sequential),
            "fail_fast" | "failfast" => Ok(FanOut::FailFast),
            "parallel" => Ok(FanOut::Parallel),
            "fire_and_forget" | "fireandforget" => Ok(FanOut::FireAndForget),
            _ => Err(UnknownFanOut(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown [`FanOut`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fan-out strategy: {0}")]
pub struct UnknownFanOut(String);

/// The target of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    kind: Cow<'static, str>,
    id: Option<String>,
}

impl Resource {
    /// Create a resource of the given kind.
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// A resource named after a type.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(short_type_name::<T>())
    }

    /// Attach an instance identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The resource kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The instance identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}

/// The unqualified name of a type, without module path or generic arguments.
///
/// `my_app::users::GetUser` becomes `GetUser`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

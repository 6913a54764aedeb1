//! Derive macros for Courier.
//!
//! - `#[derive(Message)]` - marks a type as a message
//! - `#[derive(Request)]` - implements `Request`, configured by `#[request(...)]`
//! - `#[derive(Notification)]` - implements `Notification`, configured by `#[notification(...)]`
//!
//! The generated code refers to the `courier` facade crate.

mod message;
mod notification;
mod request;

use proc_macro::TokenStream;

/// Derive macro for implementing the `Message` trait.
#[proc_macro_derive(Message)]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message_impl(input)
}

/// Derive macro for implementing the `Request` trait.
///
/// # Attributes
///
/// - `response = Type` (required)
/// - `auditable`, `authorizable`, `cacheable` - capability flags
/// - `resource = "Kind"` - resource kind for authorization checks
/// - `resource_id = field` - field used as the resource identifier
/// - `cache_key = field` - field used as the cache key
/// - `cache_expiration_secs = 60` - expiration for cached responses
///
/// ```rust,ignore
/// #[derive(Message, Request)]
/// #[request(response = User, cacheable, cache_key = id)]
/// struct GetUser { id: u64 }
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    request::derive_request_impl(input)
}

/// Derive macro for implementing the `Notification` trait.
///
/// ```rust,ignore
/// #[derive(Message, Notification)]
/// #[notification(strategy = "parallel")]
/// struct UserCreated { id: u64 }
/// ```
#[proc_macro_derive(Notification, attributes(notification))]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    notification::derive_notification_impl(input)
}

//! # courier-std
//!
//! Standard implementations for the Courier request/notification pipeline.
//!
//! This crate provides:
//! - **Handler registry**: [`registry::Registry`], built once at startup
//! - **Intercept chains**: [`chain::HCons`], [`chain::HNil`], [`chain::ChainBuilder`],
//!   [`intercepts!`] macro
//! - **Dispatching**: [`dispatch::Dispatcher`] for requests
//! - **Publishing**: [`publish::Publisher`] with four fan-out strategies
//! - **Built-in intercepts**: Validation, Audit, Authorization, Performance, Caching
//! - **Configuration**: [`config::PipelineConfig`] and [`standard::standard_chain`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use courier_core;

// Modules
pub mod cache;
pub mod chain;
pub mod config;
pub mod dispatch;
pub mod intercepts;
pub mod publish;
pub mod registry;
pub mod sinks;
pub mod standard;
pub mod testing;
pub mod validators;

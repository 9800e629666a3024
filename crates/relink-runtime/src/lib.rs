#![forbid(unsafe_code)]

//! Reactive connection between a state store and view-facing props.
//!
//! This crate provides:
//! - [`Connection`] to map store state into props and actions, with
//!   change-filtered subscriptions and sink bindings per props field
//! - [`reactive`] with the building blocks: props stream, equality strategies,
//!   field subscriptions, sinks, binders, and sectioned list data
//! - [`ConnectionConfig`] for per-connection behavior
//!
//! Everything here is single-threaded: updates and every resulting delivery
//! run synchronously on the calling thread.

pub mod config;
pub mod connection;
pub mod error;
pub mod reactive;

pub use config::ConnectionConfig;
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use connection::Connection;
pub use error::ConnectionError;
pub use reactive::{
    Binder, BindingScope, Equality, EquatableBox, PropsStream, SectionModel, SectionedDataSource,
    Sink, SinkCell, SinkLog, Subscription, SubscriptionHandle,
};
pub use relink_store as store;

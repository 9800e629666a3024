#![forbid(unsafe_code)]

//! State-store collaborator for relink.
//!
//! This crate provides:
//! - [`StateStore`], the interface a [`Connection`] consumes: current-state
//!   snapshot, a dispatch function, and a subscribe/unsubscribe pair.
//! - [`Store`], a single-threaded reducer store implementing that interface.
//! - [`Action`], the marker contract for dispatched domain actions.
//!
//! [`Connection`]: https://docs.rs/relink-runtime

pub mod action;
pub mod error;
pub mod store;

pub use action::{Action, DispatchFn};
pub use error::StoreError;
pub use store::{ListenerId, StateListener, StateStore, Store};

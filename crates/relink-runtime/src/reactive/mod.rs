#![forbid(unsafe_code)]

//! Reactive props plumbing for relink connections.
//!
//! This module provides the change-tracking pieces a [`Connection`] is built from:
//!
//! - [`PropsStream`]: A shared, version-tracked holder of the current props
//!   with synchronous `(previous, next)` listeners.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Equality`] / [`EquatableBox`]: Pluggable comparison for field types
//!   with or without native equality, liftable to `Option` and `Vec`.
//! - [`subscribe_field`]: Distinct-until-changed subscription to one field.
//! - [`Binder`] and [`Sink`]: Push a field, optionally mapped, into a consumer.
//! - [`BindingScope`]: Owns the subscriptions of one logical scope.
//! - [`SectionedDataSource`]: Sink for sectioned list data.
//!
//! # Architecture
//!
//! `PropsStream<P>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Listeners are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! Field subscriptions are props listeners that project both sides of a
//! transition through an accessor and compare the projections.
//!
//! # Invariants
//!
//! 1. Props version increments exactly once per update.
//! 2. Listeners are notified in registration order.
//! 3. A field subscription fires at most once per update, and only when its
//!    equality reports the projected values as different.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. Updates issued during a notification pass are delivered after it, in order.
//!
//! [`Connection`]: crate::Connection

pub mod binding;
pub mod equality;
pub mod items;
pub mod props;
pub mod sink;
pub mod subscription;

pub use binding::{Binder, BindingScope, SubscriptionHandle};
pub use equality::{Equality, EquatableBox};
pub use items::{SectionModel, SectionedDataSource};
pub use props::{PropsStream, Subscription};
pub use sink::{Optional, Sink, SinkCell, SinkLog};
pub use subscription::{Accessor, subscribe_field};

#![forbid(unsafe_code)]

//! Binding props fields to sinks.
//!
//! A [`Binder`] is a thin adapter over a field subscription: it selects a
//! field, filters it with an [`Equality`], optionally maps the value, and
//! pushes the result into a [`Sink`]. The [`bind!`] and [`subscribe!`] macros
//! provide key-path style sugar over the connection methods.
//!
//! # Usage
//!
//! ```ignore
//! use relink_runtime::reactive::{Equality, SinkCell};
//!
//! let title = SinkCell::new();
//! connection.bind(|p: &Props| p.title.clone(), title.clone());
//!
//! // Optional field to a non-optional sink: the mapping handles `None`.
//! let hidden = SinkCell::new();
//! connection.binder(|p: &Props| p.count).map(|c: Option<u32>| c.is_none()).to(hidden.clone());
//!
//! // Resort a collection before display; change detection stays on the
//! // unsorted vector.
//! connection
//!     .binder(|p: &Props| p.rows.clone())
//!     .map(|mut rows: Vec<u32>| { rows.sort(); rows })
//!     .to(list.clone());
//! ```
//!
//! # Invariants
//!
//! 1. Equality is evaluated on the source field, before any mapping. Two
//!    different source values that map to the same output both deliver.
//! 2. The mapping runs once per delivery, never on filtered-out updates.
//! 3. Delivery happens synchronously inside the props update that caused it.
//! 4. A binding stays live until its [`BindingScope`] releases it: scope drop,
//!    [`BindingScope::clear`], or [`SubscriptionHandle::cancel`].
//!
//! # Failure Modes
//!
//! - Mapping or sink panic: propagates to the caller of the props update.
//! - Handle outlives its scope: `cancel()` returns `false`, nothing else happens.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::equality::Equality;
use super::props::{PropsStream, Subscription};
use super::sink::{Optional, Sink};
use super::subscription::{Accessor, subscribe_field};

// ---------------------------------------------------------------------------
// BindingScope: lifecycle management
// ---------------------------------------------------------------------------

/// Collects subscriptions and bindings for a logical scope (e.g., a connection).
///
/// When the scope is dropped, all held subscriptions are released, cleanly
/// disconnecting every binding registered through it.
///
/// # Invariants
///
/// 1. Subscriptions are released in reverse registration order on drop.
/// 2. After drop, no callbacks from this scope will fire.
/// 3. `clear()` releases all subscriptions immediately (reusable scope).
/// 4. Ids are never reused within one scope.
pub struct BindingScope {
    subscriptions: Vec<(u64, Subscription)>,
    next_id: u64,
}

impl BindingScope {
    /// Create an empty binding scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }

    /// Keep `sub` alive until released. Returns its id within this scope.
    pub fn hold(&mut self, sub: Subscription) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.push((id, sub));
        id
    }

    /// Remove one subscription, handing it back to the caller.
    ///
    /// Dropping the returned guard outside of any borrow of the scope keeps
    /// re-entrant cleanup safe.
    pub fn take(&mut self, id: u64) -> Option<Subscription> {
        let index = self.subscriptions.iter().position(|(held, _)| *held == id)?;
        Some(self.subscriptions.remove(index).1)
    }

    /// Release one subscription. Returns `false` if `id` is not held.
    pub fn release(&mut self, id: u64) -> bool {
        self.take(id).is_some()
    }

    /// Whether `id` is still held.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.subscriptions.iter().any(|(held, _)| *held == id)
    }

    /// Number of active subscriptions/bindings in this scope.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope has no active bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions immediately (scope becomes empty but reusable).
    pub fn clear(&mut self) {
        while self.subscriptions.pop().is_some() {}
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SubscriptionHandle
// ---------------------------------------------------------------------------

/// Refers to one subscription held by a [`BindingScope`].
///
/// Dropping the handle does **not** cancel anything; the scope owns the
/// subscription. Use [`cancel`](Self::cancel) to release it early.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    scope: Weak<RefCell<BindingScope>>,
}

impl SubscriptionHandle {
    pub(crate) fn register(scope: &Rc<RefCell<BindingScope>>, sub: Subscription) -> Self {
        let id = scope.borrow_mut().hold(sub);
        tracing::trace!(binding = id, "binding registered");
        Self {
            id,
            scope: Rc::downgrade(scope),
        }
    }

    /// Id within the owning scope.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the subscription is still delivering.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scope
            .upgrade()
            .is_some_and(|scope| scope.borrow().contains(self.id))
    }

    /// Stop this subscription. Returns `false` if it was already gone.
    pub fn cancel(&self) -> bool {
        let Some(scope) = self.scope.upgrade() else {
            return false;
        };
        let taken = scope.borrow_mut().take(self.id);
        let released = taken.is_some();
        drop(taken);
        if released {
            tracing::trace!(binding = self.id, "binding cancelled");
        }
        released
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Binder<P, T, U>: field to sink
// ---------------------------------------------------------------------------

/// Builder for a binding from props field `T` to a sink of `U`.
///
/// Obtained from [`Connection::binder`](crate::Connection::binder) or
/// [`Connection::binder_with`](crate::Connection::binder_with).
#[must_use = "a binder does nothing until `to` is called"]
pub struct Binder<P, T, U = T> {
    props: PropsStream<P>,
    scope: Rc<RefCell<BindingScope>>,
    accessor: Accessor<P, T>,
    equality: Equality<T>,
    mapping: Rc<dyn Fn(T) -> U>,
    emit_current: bool,
}

impl<P: 'static, T: 'static> Binder<P, T, T> {
    pub(crate) fn new(
        props: PropsStream<P>,
        scope: Rc<RefCell<BindingScope>>,
        accessor: Accessor<P, T>,
        equality: Equality<T>,
        emit_current: bool,
    ) -> Self {
        Self {
            props,
            scope,
            accessor,
            equality,
            mapping: Rc::new(|value: T| value),
            emit_current,
        }
    }
}

impl<P: 'static, T: 'static, U: 'static> Binder<P, T, U> {
    /// Replace the equality strategy applied to the source field.
    pub fn with_equality(mut self, equality: Equality<T>) -> Self {
        self.equality = equality;
        self
    }

    /// Deliver the current value once when the binding is registered.
    pub fn emit_current(mut self, emit: bool) -> Self {
        self.emit_current = emit;
        self
    }

    /// Transform values before delivery. Change detection stays on the field.
    pub fn map<V: 'static>(self, f: impl Fn(U) -> V + 'static) -> Binder<P, T, V> {
        let inner = self.mapping;
        Binder {
            props: self.props,
            scope: self.scope,
            accessor: self.accessor,
            equality: self.equality,
            mapping: Rc::new(move |value: T| f(inner(value))),
            emit_current: self.emit_current,
        }
    }

    /// Push into `sink`.
    pub fn to(self, sink: impl Sink<U> + 'static) -> SubscriptionHandle {
        let mapping = self.mapping;
        let sub = subscribe_field(
            &self.props,
            self.accessor,
            self.equality,
            self.emit_current,
            move |value| sink.accept(mapping(value)),
        );
        SubscriptionHandle::register(&self.scope, sub)
    }

    /// Push into a sink that expects `Option<U>`, wrapping every value in `Some`.
    pub fn to_optional(self, sink: impl Sink<Option<U>> + 'static) -> SubscriptionHandle {
        self.to(Optional::new(sink))
    }
}

impl<P, T, U> fmt::Debug for Binder<P, T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("emit_current", &self.emit_current)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Bind a props field, named by path, to a sink with native equality.
///
/// # Examples
///
/// ```ignore
/// let label = SinkCell::new();
/// bind!(connection, title => label.clone());
/// bind!(connection, header.subtitle => |s: String| println!("{s}"));
/// ```
#[macro_export]
macro_rules! bind {
    ($conn:expr, $($field:ident).+ => $sink:expr) => {
        $conn.bind(move |props| props.$($field).+.clone(), $sink)
    };
}

/// Subscribe to a props field, named by path, with native equality.
///
/// # Examples
///
/// ```ignore
/// subscribe!(connection, title => |t: String| println!("title: {t}"));
/// ```
#[macro_export]
macro_rules! subscribe {
    ($conn:expr, $($field:ident).+ => $on_change:expr) => {
        $conn.subscribe(move |props| props.$($field).+.clone(), $on_change)
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

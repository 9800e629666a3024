#![forbid(unsafe_code)]

//! Reducer store and the [`StateStore`] interface consumed by connections.
//!
//! # Design
//!
//! [`Store<S, A>`] is a cheap `Clone` handle over `Rc` shared state. The
//! current state is kept as an `Rc<S>` snapshot so listeners and readers can
//! hold on to it without cloning the state itself.
//!
//! # Invariants
//!
//! 1. A dispatch runs the reducer exactly once and replaces the state
//!    wholesale before any listener is notified.
//! 2. Listeners are notified in registration order with the new state.
//! 3. A listener removed during a notification pass is not called for the
//!    remainder of that pass.
//! 4. Notification passes never interleave. A pass started by a dispatch from
//!    inside a listener is queued behind the current one, so every listener
//!    sees transitions in order and ends on the latest state.
//! 5. After [`tear_down`](Store::tear_down) no listener is ever called again.
//!
//! # Failure Modes
//!
//! - **Dispatch from inside the reducer**: rejected with
//!   [`StoreError::ReentrantDispatch`]; the state is left untouched.
//! - **Reducer panics**: propagates to the dispatcher. The store stays usable.
//! - **Dispatch from inside a listener**: allowed. The reducer runs and the
//!   state is replaced right away; its notification pass runs after the
//!   current pass, before the outer dispatch returns.
//! - **Listener panics**: propagates to the dispatcher. Queued passes are
//!   discarded and the next dispatch notifies normally.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::action::{Action, DispatchFn};
use crate::error::StoreError;

/// Callback invoked with the latest state after every transition.
pub type StateListener<S> = Rc<dyn Fn(&S)>;

/// Opaque identifier of a store registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The capability a connection needs from a state store.
///
/// Implementations own reducer execution and fan-out to all of their
/// subscribers. Duplicate registrations and unknown-id removals are tolerated.
pub trait StateStore {
    /// Snapshot type handed to listeners.
    type State: 'static;
    /// Domain action type accepted by the dispatch function.
    type Action: Action;

    /// Current state snapshot.
    fn state(&self) -> Rc<Self::State>;

    /// A dispatch function routed through the store's current dispatch path.
    fn dispatch_function(&self) -> DispatchFn<Self::Action>;

    /// Register `listener` for every subsequent state transition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] if the store no longer accepts listeners.
    fn subscribe(&self, listener: StateListener<Self::State>) -> Result<ListenerId, StoreError>;

    /// Remove a registration. Returns `false` if `id` was not registered.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

type Reducer<S, A> = Box<dyn Fn(&A, &S) -> S>;

struct StoreInner<S, A> {
    state: RefCell<Rc<S>>,
    reducer: Reducer<S, A>,
    listeners: RefCell<Vec<(ListenerId, StateListener<S>)>>,
    next_id: Cell<u64>,
    /// Replacement dispatch path (test fakes, middleware).
    dispatch_override: RefCell<Option<DispatchFn<A>>>,
    reducing: Cell<bool>,
    /// States whose notification pass has not run yet.
    pending: RefCell<VecDeque<Rc<S>>>,
    notifying: Cell<bool>,
    torn_down: Cell<bool>,
}

/// Resets the reducing flag even if the reducer unwinds.
struct ReducingGuard<'a>(&'a Cell<bool>);

impl Drop for ReducingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Ends the notification pass, dropping queued passes on unwind.
struct PassGuard<'a, S> {
    notifying: &'a Cell<bool>,
    pending: &'a RefCell<VecDeque<Rc<S>>>,
}

impl<S> Drop for PassGuard<'_, S> {
    fn drop(&mut self) {
        self.notifying.set(false);
        self.pending.borrow_mut().clear();
    }
}

/// Single-threaded reducer store.
///
/// Cloning a `Store` creates a new handle to the **same** state.
pub struct Store<S, A> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("subscriber_count", &self.inner.listeners.borrow().len())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

impl<S: 'static, A: Action> Store<S, A> {
    /// Create a store from a reducer `(action, state) -> state` and an initial state.
    pub fn new(reducer: impl Fn(&A, &S) -> S + 'static, state: S) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(state)),
                reducer: Box::new(reducer),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                dispatch_override: RefCell::new(None),
                reducing: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
                torn_down: Cell::new(false),
            }),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Dispatch through the current dispatch path.
    ///
    /// With no replacement installed this runs the reducer and notifies
    /// listeners; failures are logged and the action is dropped.
    pub fn dispatch(&self, action: A) {
        let replacement = self.inner.dispatch_override.borrow().clone();
        if let Some(dispatch) = replacement {
            dispatch(action);
            return;
        }
        let name = action.name();
        if let Err(err) = self.try_dispatch(action) {
            tracing::error!(action = name, error = %err, "dropped action");
        }
    }

    /// Run the reducer for `action` and notify listeners.
    ///
    /// Bypasses any dispatch function installed with
    /// [`set_dispatch_function`](Self::set_dispatch_function).
    ///
    /// # Errors
    ///
    /// - [`StoreError::TornDown`] after [`tear_down`](Self::tear_down).
    /// - [`StoreError::ReentrantDispatch`] when called from inside the reducer.
    pub fn try_dispatch(&self, action: A) -> Result<(), StoreError> {
        if self.inner.torn_down.get() {
            return Err(StoreError::TornDown);
        }
        if self.inner.reducing.get() {
            return Err(StoreError::ReentrantDispatch);
        }

        let next = {
            self.inner.reducing.set(true);
            let _guard = ReducingGuard(&self.inner.reducing);
            let current = self.state();
            Rc::new((self.inner.reducer)(&action, &current))
        };
        *self.inner.state.borrow_mut() = Rc::clone(&next);
        self.inner.pending.borrow_mut().push_back(next);

        if self.inner.notifying.get() {
            tracing::trace!(action = action.name(), "store pass queued behind active pass");
            return Ok(());
        }
        tracing::trace!(action = action.name(), "store dispatch");
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        self.inner.notifying.set(true);
        let _guard = PassGuard {
            notifying: &self.inner.notifying,
            pending: &self.inner.pending,
        };
        loop {
            let Some(state) = self.inner.pending.borrow_mut().pop_front() else {
                return;
            };
            let ids: Vec<ListenerId> = self
                .inner
                .listeners
                .borrow()
                .iter()
                .map(|(id, _)| *id)
                .collect();
            for id in ids {
                let listener = self
                    .inner
                    .listeners
                    .borrow()
                    .iter()
                    .find(|(registered, _)| *registered == id)
                    .map(|(_, listener)| Rc::clone(listener));
                if let Some(listener) = listener {
                    listener(&state);
                }
            }
        }
    }

    /// Replace the dispatch path. Dispatch functions handed out earlier
    /// observe the replacement.
    pub fn set_dispatch_function(&self, dispatch: impl Fn(A) + 'static) {
        *self.inner.dispatch_override.borrow_mut() = Some(Rc::new(dispatch));
    }

    /// Restore the reducer dispatch path.
    pub fn reset_dispatch_function(&self) {
        self.inner.dispatch_override.borrow_mut().take();
    }

    /// Number of live registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Drop every registration and refuse further subscriptions and actions.
    pub fn tear_down(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        let dropped = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        tracing::debug!(listeners = dropped.len(), "store torn down");
    }

    /// Whether [`tear_down`](Self::tear_down) has been called.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }
}

impl<S: 'static, A: Action> StateStore for Store<S, A> {
    type State = S;
    type Action = A;

    fn state(&self) -> Rc<S> {
        Store::state(self)
    }

    fn dispatch_function(&self) -> DispatchFn<A> {
        let weak: Weak<StoreInner<S, A>> = Rc::downgrade(&self.inner);
        Rc::new(move |action: A| match weak.upgrade() {
            Some(inner) => Store { inner }.dispatch(action),
            None => tracing::warn!(action = action.name(), "dispatch after store was dropped"),
        })
    }

    fn subscribe(&self, listener: StateListener<S>) -> Result<ListenerId, StoreError> {
        if self.inner.torn_down.get() {
            return Err(StoreError::TornDown);
        }
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        tracing::trace!(listener = id.0, "store subscribe");
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        before != listeners.len()
    }
}

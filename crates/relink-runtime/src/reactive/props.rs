#![forbid(unsafe_code)]

//! Replay-latest props holder with synchronous transition listeners.
//!
//! # Design
//!
//! [`PropsStream<P>`] keeps exactly one current value as an `Rc<P>` and a list
//! of listeners stored as `Weak` function pointers. [`accept`](PropsStream::accept)
//! swaps the value and calls every live listener with the `(previous, next)`
//! pair before returning. There is no equality check at this level: field
//! subscriptions do their own filtering.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per `accept`.
//! 2. Listeners are notified in registration order.
//! 3. Reads never lag: `value()` observes an accepted value immediately, even
//!    from inside a listener.
//! 4. Transitions are delivered one pass at a time. An `accept` issued from a
//!    listener is queued and its pass starts after the current pass completes.
//! 5. Dropping a [`Subscription`] removes the listener before its next call.
//!
//! # Failure Modes
//!
//! - **Listener panics**: propagates to the caller of `accept`. Queued passes
//!   are discarded and the stream is ready for the next update.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<P> = dyn Fn(&P, &P);

struct PropsInner<P> {
    current: Rc<P>,
    version: u64,
    listeners: Vec<Weak<Listener<P>>>,
    pending: VecDeque<(Rc<P>, Rc<P>)>,
    notifying: bool,
}

/// RAII guard for a props listener. Dropping it unsubscribes.
#[must_use = "dropping this guard unsubscribes the listener"]
pub struct Subscription {
    _listener: Rc<dyn std::any::Any>,
}

impl Subscription {
    fn new<P: 'static>(listener: Rc<Listener<P>>) -> Self {
        Self {
            _listener: Rc::new(listener),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Shared, single-threaded holder of the current props value.
///
/// Cloning a `PropsStream` creates a new handle to the **same** value.
pub struct PropsStream<P> {
    inner: Rc<RefCell<PropsInner<P>>>,
}

impl<P> Clone for PropsStream<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for PropsStream<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PropsStream")
            .field("value", &inner.current)
            .field("version", &inner.version)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Clears the in-progress flag on exit, including unwinding.
struct PassGuard<'a, P> {
    inner: &'a RefCell<PropsInner<P>>,
}

impl<P> Drop for PassGuard<'_, P> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.notifying = false;
        inner.pending.clear();
    }
}

impl<P: 'static> PropsStream<P> {
    /// Create a stream holding `initial`.
    pub fn new(initial: P) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PropsInner {
                current: Rc::new(initial),
                version: 0,
                listeners: Vec::new(),
                pending: VecDeque::new(),
                notifying: false,
            })),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> Rc<P> {
        Rc::clone(&self.inner.borrow().current)
    }

    /// Run `f` against the current value without cloning the handle.
    pub fn with<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        let current = self.value();
        f(&current)
    }

    /// Number of `accept` calls so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Register `listener` for every subsequent transition.
    pub fn listen(&self, listener: impl Fn(&P, &P) + 'static) -> Subscription {
        let strong: Rc<Listener<P>> = Rc::new(listener);
        self.inner.borrow_mut().listeners.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Replace the current value and notify listeners.
    pub fn accept(&self, props: P) {
        let next = Rc::new(props);
        {
            let mut inner = self.inner.borrow_mut();
            let previous = std::mem::replace(&mut inner.current, Rc::clone(&next));
            inner.version += 1;
            inner.pending.push_back((previous, next));
            if inner.notifying {
                tracing::trace!(version = inner.version, "props update queued behind active pass");
                return;
            }
            inner.notifying = true;
        }
        self.flush();
    }

    fn flush(&self) {
        let _guard = PassGuard { inner: &self.inner };
        loop {
            let (previous, next, listeners) = {
                let mut inner = self.inner.borrow_mut();
                let Some((previous, next)) = inner.pending.pop_front() else {
                    return;
                };
                inner.listeners.retain(|w| w.strong_count() > 0);
                (previous, next, inner.listeners.clone())
            };
            tracing::trace!(listeners = listeners.len(), "props pass");
            for weak in &listeners {
                if let Some(listener) = weak.upgrade() {
                    listener(&previous, &next);
                }
            }
        }
    }
}

impl<P: Clone + 'static> PropsStream<P> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> P {
        self.value().as_ref().clone()
    }
}

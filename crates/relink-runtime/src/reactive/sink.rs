#![forbid(unsafe_code)]

//! Push targets for bindings.
//!
//! A [`Sink<T>`] is anything that accepts pushed values: a closure, a UI
//! property adapter, or one of the small holders here. Adapting concrete
//! toolkit observers to `Sink` is the caller's job.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A consumer of pushed values.
pub trait Sink<T> {
    /// Deliver `value`.
    fn accept(&self, value: T);
}

impl<T, F: Fn(T)> Sink<T> for F {
    fn accept(&self, value: T) {
        self(value);
    }
}

/// Wraps each pushed value in `Some` before forwarding.
///
/// Lets a sink expecting `Option<T>` receive a non-optional field.
#[derive(Debug, Clone)]
pub struct Optional<S> {
    inner: S,
}

impl<S> Optional<S> {
    /// Adapt `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<T, S: Sink<Option<T>>> Sink<T> for Optional<S> {
    fn accept(&self, value: T) {
        self.inner.accept(Some(value));
    }
}

// ---------------------------------------------------------------------------
// SinkCell<T>
// ---------------------------------------------------------------------------

/// Holds the most recently pushed value, like a widget property.
///
/// Cloning shares the cell.
pub struct SinkCell<T> {
    value: Rc<RefCell<Option<T>>>,
}

impl<T> SinkCell<T> {
    /// Empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Rc::new(RefCell::new(None)),
        }
    }

    /// Cell starting at `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(Some(value))),
        }
    }

    /// Whether anything has been pushed (or seeded).
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.borrow().is_some()
    }

    /// Take the held value, leaving the cell empty.
    pub fn take(&self) -> Option<T> {
        self.value.borrow_mut().take()
    }
}

impl<T: Clone> SinkCell<T> {
    /// Clone of the held value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.value.borrow().clone()
    }
}

impl<T> Clone for SinkCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> Default for SinkCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SinkCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SinkCell").field(&self.value.borrow()).finish()
    }
}

impl<T> Sink<T> for SinkCell<T> {
    fn accept(&self, value: T) {
        *self.value.borrow_mut() = Some(value);
    }
}

// ---------------------------------------------------------------------------
// SinkLog<T>
// ---------------------------------------------------------------------------

/// Records every pushed value in delivery order.
pub struct SinkLog<T> {
    values: Rc<RefCell<Vec<T>>>,
}

impl<T> SinkLog<T> {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of deliveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Whether nothing was delivered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Drain the recorded values.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.values.borrow_mut())
    }
}

impl<T: Clone> SinkLog<T> {
    /// Copy of everything delivered so far.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.values.borrow().clone()
    }

    /// Most recent delivery.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.values.borrow().last().cloned()
    }
}

impl<T> Clone for SinkLog<T> {
    fn clone(&self) -> Self {
        Self {
            values: Rc::clone(&self.values),
        }
    }
}

impl<T> Default for SinkLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SinkLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.borrow().iter()).finish()
    }
}

impl<T> Sink<T> for SinkLog<T> {
    fn accept(&self, value: T) {
        self.values.borrow_mut().push(value);
    }
}

#![forbid(unsafe_code)]

//! Change-filtered subscriptions to a single derived field of props.
//!
//! A field subscription listens to a [`PropsStream`] and, for every
//! transition, evaluates its accessor against the previous and the next props.
//! The two results are compared with the subscription's [`Equality`]; only an
//! inequality calls the change callback, with the new field value.
//!
//! # Invariants
//!
//! 1. At most one callback per props transition per subscription.
//! 2. Zero callbacks on registration unless `emit_current` is requested.
//! 3. The comparison is always between the field values of the previous and
//!    next props, never against the last delivered value.
//!
//! # Failure Modes
//!
//! Accessor, equality, and callback panics propagate to whoever triggered the
//! props update.

use std::rc::Rc;

use super::equality::{Equality, EquatableBox};
use super::props::{PropsStream, Subscription};

/// Shared field accessor `Props -> T`.
pub type Accessor<P, T> = Rc<dyn Fn(&P) -> T>;

/// Subscribe to the field selected by `accessor`.
///
/// With `emit_current` set, `on_change` is called once right away with the
/// field's current value.
pub fn subscribe_field<P, T>(
    props: &PropsStream<P>,
    accessor: Accessor<P, T>,
    equality: Equality<T>,
    emit_current: bool,
    on_change: impl Fn(T) + 'static,
) -> Subscription
where
    P: 'static,
    T: 'static,
{
    if emit_current {
        on_change(props.with(|current| accessor(current)));
    }

    props.listen(move |previous: &P, next: &P| {
        let before = EquatableBox::new(accessor(previous), equality.clone());
        let after = accessor(next);
        if !before.matches(&after) {
            on_change(after);
        }
    })
}

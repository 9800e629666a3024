#![forbid(unsafe_code)]

//! Domain actions and the dispatch function that carries them to a store.

use std::fmt;
use std::rc::Rc;

/// Marker contract for values dispatched to a store.
///
/// No fields are required. [`name`](Action::name) exists for log output and
/// defaults to the Rust type name.
pub trait Action: fmt::Debug + 'static {
    /// Short name used in log records.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A shareable dispatch capability.
///
/// Actions bundles capture one of these and call it from their closures.
pub type DispatchFn<A> = Rc<dyn Fn(A)>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    struct Ping;

    impl Action for Ping {}

    #[derive(Debug)]
    struct Named;

    impl Action for Named {
        fn name(&self) -> &'static str {
            "named"
        }
    }

    #[test]
    fn default_name_is_type_name() {
        assert!(Ping.name().ends_with("Ping"));
    }

    #[test]
    fn name_can_be_overridden() {
        assert_eq!(Named.name(), "named");
    }

    #[test]
    fn dispatch_fn_is_shareable() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let dispatch: DispatchFn<Ping> = Rc::new(move |a| s.borrow_mut().push(a));
        let copy = Rc::clone(&dispatch);
        dispatch(Ping);
        copy(Ping);
        assert_eq!(*seen.borrow(), vec![Ping, Ping]);
    }
}

#![forbid(unsafe_code)]

//! Equality strategies for distinct-until-changed filtering.
//!
//! Field types do not have to implement [`PartialEq`]. Callers that bind such
//! a field supply an explicit [`Equality`]; everything else defaults to
//! [`Equality::native`].
//!
//! # Lifting
//!
//! - [`Equality::optional`]: `(None, None)` equal, `(None, Some)` and
//!   `(Some, None)` unequal, `(Some(a), Some(b))` delegated.
//! - [`Equality::elementwise`]: vectors of different length are unequal,
//!   otherwise elements are compared pairwise, in order.
//!
//! Strategies are assumed reflexive and stable for a given pair. Nothing here
//! verifies that.

use std::fmt;
use std::rc::Rc;

/// A comparison function `(T, T) -> bool`.
///
/// Cloning an `Equality` shares the underlying function.
pub struct Equality<T: ?Sized> {
    eq: Rc<dyn Fn(&T, &T) -> bool>,
}

impl<T: ?Sized> Clone for Equality<T> {
    fn clone(&self) -> Self {
        Self {
            eq: Rc::clone(&self.eq),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equality").finish_non_exhaustive()
    }
}

impl<T: ?Sized + 'static> Equality<T> {
    /// Strategy backed by an arbitrary comparison function.
    pub fn new(eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self { eq: Rc::new(eq) }
    }

    /// Compare `a` and `b`.
    #[inline]
    #[must_use]
    pub fn eq(&self, a: &T, b: &T) -> bool {
        (self.eq)(a, b)
    }

    /// Strategy that reports every pair as different.
    ///
    /// A subscription using it delivers on every props update.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_, _| false)
    }

    /// Compare by a derived key.
    pub fn by_key<K: PartialEq>(key: impl Fn(&T) -> K + 'static) -> Self {
        Self::new(move |a, b| key(a) == key(b))
    }
}

impl<T: PartialEq + ?Sized + 'static> Equality<T> {
    /// Native structural equality.
    #[must_use]
    pub fn native() -> Self {
        Self::new(|a: &T, b: &T| a == b)
    }
}

impl<T: PartialEq + 'static> Default for Equality<T> {
    fn default() -> Self {
        Self::native()
    }
}

impl<T: 'static> Equality<T> {
    /// Lift to optional values.
    #[must_use]
    pub fn optional(self) -> Equality<Option<T>> {
        Equality::new(move |a: &Option<T>, b: &Option<T>| match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.eq(a, b),
            _ => false,
        })
    }

    /// Lift to ordered collections, comparing element by element.
    #[must_use]
    pub fn elementwise(self) -> Equality<Vec<T>> {
        Equality::new(move |a: &Vec<T>, b: &Vec<T>| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.eq(x, y))
        })
    }
}

// ---------------------------------------------------------------------------
// EquatableBox<T>
// ---------------------------------------------------------------------------

/// A value paired with the strategy used to compare it.
///
/// `PartialEq` delegates to the left-hand operand's strategy, which lets
/// values without native equality flow through `==`-based filters.
pub struct EquatableBox<T> {
    value: T,
    equality: Equality<T>,
}

impl<T: 'static> EquatableBox<T> {
    /// Box `value` with `equality`.
    pub fn new(value: T, equality: Equality<T>) -> Self {
        Self { value, equality }
    }

    /// Borrow the boxed value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap the boxed value.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Compare against a bare value with this box's strategy.
    #[must_use]
    pub fn matches(&self, other: &T) -> bool {
        self.equality.eq(&self.value, other)
    }
}

impl<T: 'static> PartialEq for EquatableBox<T> {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.value)
    }
}

impl<T: Clone> Clone for EquatableBox<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            equality: self.equality.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for EquatableBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EquatableBox").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deliberately lacks `PartialEq`.
    #[derive(Debug, Clone)]
    struct Opaque {
        label: String,
    }

    fn opaque(label: &str) -> Opaque {
        Opaque {
            label: label.to_string(),
        }
    }

    fn by_label() -> Equality<Opaque> {
        Equality::new(|a: &Opaque, b: &Opaque| a.label == b.label)
    }

    #[test]
    fn native_uses_partial_eq() {
        let eq = Equality::<i32>::native();
        assert!(eq.eq(&1, &1));
        assert!(!eq.eq(&1, &2));
    }

    #[test]
    fn default_is_native() {
        let eq: Equality<String> = Equality::default();
        assert!(eq.eq(&"a".to_string(), &"a".to_string()));
    }

    #[test]
    fn custom_strategy_on_opaque_type() {
        let eq = by_label();
        assert!(eq.eq(&opaque("x"), &opaque("x")));
        assert!(!eq.eq(&opaque("x"), &opaque("y")));
    }

    #[test]
    fn never_is_always_unequal() {
        let eq = Equality::<i32>::never();
        assert!(!eq.eq(&3, &3));
    }

    #[test]
    fn by_key_projects() {
        let eq = Equality::by_key(|s: &String| s.len());
        assert!(eq.eq(&"ab".to_string(), &"cd".to_string()));
        assert!(!eq.eq(&"ab".to_string(), &"abc".to_string()));
    }

    #[test]
    fn optional_lifting() {
        let eq = by_label().optional();
        assert!(eq.eq(&None, &None));
        assert!(!eq.eq(&None, &Some(opaque("a"))));
        assert!(!eq.eq(&Some(opaque("a")), &None));
        assert!(eq.eq(&Some(opaque("a")), &Some(opaque("a"))));
        assert!(!eq.eq(&Some(opaque("a")), &Some(opaque("b"))));
    }

    #[test]
    fn elementwise_lifting() {
        let eq = by_label().elementwise();
        let ab = vec![opaque("a"), opaque("b")];
        let ba = vec![opaque("b"), opaque("a")];
        assert!(eq.eq(&ab, &ab.clone()));
        assert!(!eq.eq(&ab, &ba), "order matters");
        assert!(!eq.eq(&ab, &ab[..1].to_vec()), "length matters");
        assert!(eq.eq(&Vec::new(), &Vec::new()));
    }

    #[test]
    fn nested_lifting() {
        let eq = by_label().elementwise().optional();
        assert!(eq.eq(&Some(vec![opaque("a")]), &Some(vec![opaque("a")])));
        assert!(!eq.eq(&Some(vec![]), &None));
    }

    #[test]
    fn clone_shares_function() {
        let eq = by_label();
        let copy = eq.clone();
        assert!(copy.eq(&opaque("z"), &opaque("z")));
    }

    #[test]
    fn equatable_box_delegates() {
        let a = EquatableBox::new(opaque("same"), by_label());
        let b = EquatableBox::new(opaque("same"), by_label());
        let c = EquatableBox::new(opaque("other"), by_label());
        assert!(a == b);
        assert!(a != c);
        assert!(a.matches(&opaque("same")));
        assert_eq!(c.into_inner().label, "other");
    }

    #[test]
    fn equatable_box_uses_left_strategy() {
        let lenient = EquatableBox::new(opaque("a"), Equality::new(|_: &Opaque, _: &Opaque| true));
        let strict = EquatableBox::new(opaque("b"), by_label());
        assert!(lenient == strict);
        assert!(strict != lenient);
    }

    #[test]
    fn equatable_box_debug() {
        let boxed = EquatableBox::new(5, Equality::native());
        assert_eq!(format!("{boxed:?}"), "EquatableBox(5)");
        assert_eq!(*boxed.clone().value(), 5);
    }
}

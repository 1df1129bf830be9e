/*!
 * Comparators
 * Total orders over element types, used by the priority queues
 */

use std::cmp::Ordering;

/// A total order over `T`
///
/// Implemented for any `Fn(&T, &T) -> Ordering`, so closures work directly.
/// Implementations must be total: `compare(a, b)` and `compare(b, a)` must
/// agree, and the relation must be transitive.
pub trait Compare<T: ?Sized> {
    /// Compare `a` with `b`
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline(always)]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The `Ord` order of `T`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Compare<T> for NaturalOrder {
    #[inline(always)]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts another comparator (turns a min-heap into a max-heap)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Compare<T>> Compare<T> for Reverse<C> {
    #[inline(always)]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Orders elements by a key extracted from them
#[derive(Debug, Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<T: ?Sized, K: Ord, F> Compare<T> for ByKey<F>
where
    F: Fn(&T) -> K,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a).cmp(&(self.0)(b))
    }
}

/// Adapts a comparator that returns a signed integer
///
/// Negative means `a < b`, zero equal, positive `a > b`.
#[derive(Debug, Clone, Copy)]
pub struct Signum<F>(pub F);

impl<T: ?Sized, F> Compare<T> for Signum<F>
where
    F: Fn(&T, &T) -> i64,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b).cmp(&0)
    }
}

/// Comparator for primitive numbers, returning -1/0/1
#[inline]
pub fn primitive<T: PartialOrd>(a: &T, b: &T) -> i64 {
    match a.partial_cmp(b) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Greater) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_and_natural_agree() {
        let closure = |a: &i32, b: &i32| a.cmp(b);
        for (a, b) in [(1, 2), (2, 2), (3, 2)] {
            assert_eq!(closure.compare(&a, &b), NaturalOrder.compare(&a, &b));
        }
    }

    #[test]
    fn test_reverse() {
        assert_eq!(Reverse(NaturalOrder).compare(&1, &2), Ordering::Greater);
        assert_eq!(Reverse(NaturalOrder).compare(&2, &2), Ordering::Equal);
    }

    #[test]
    fn test_by_key() {
        let by_len = ByKey(|s: &&str| s.len());
        assert_eq!(by_len.compare(&"ab", &"abc"), Ordering::Less);
        assert_eq!(by_len.compare(&"xyz", &"abc"), Ordering::Equal);
    }

    #[test]
    fn test_signum() {
        let cmp = Signum(primitive::<f64>);
        assert_eq!(cmp.compare(&1.5, &2.5), Ordering::Less);
        assert_eq!(cmp.compare(&2.5, &2.5), Ordering::Equal);
        assert_eq!(cmp.compare(&3.5, &2.5), Ordering::Greater);
    }
}

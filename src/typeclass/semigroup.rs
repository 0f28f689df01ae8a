//! Semigroup type class - types with an associative binary operation.
//!
//! # Laws
//!
//! For all `a`, `b`, `c` of type `T`:
//!
//! ```text
//! (a.combine(b)).combine(c) == a.combine(b.combine(c))
//! ```
//!
//! # Examples
//!
//! ```rust
//! use effio::typeclass::Semigroup;
//!
//! let hello = String::from("Hello, ");
//! let world = String::from("World!");
//! assert_eq!(hello.combine(world), "Hello, World!");
//! ```

use std::ops::{Add, Mul};

use super::wrappers::{Max, Min, Product, Sum};

/// A type class for types with an associative binary operation.
pub trait Semigroup {
    /// Combines two values into one.
    ///
    /// This operation must be associative.
    #[must_use]
    fn combine(self, other: Self) -> Self;

    /// Reduces all elements in an iterator using the semigroup operation.
    ///
    /// Returns `None` if the iterator is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::typeclass::{Semigroup, Sum};
    ///
    /// assert_eq!(Sum::reduce_all(vec![Sum(1), Sum(2), Sum(3)]), Some(Sum(6)));
    /// assert_eq!(Sum::<i32>::reduce_all(Vec::new()), None);
    /// ```
    fn reduce_all<I>(iterator: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
        Self: Sized,
    {
        iterator.into_iter().reduce(Self::combine)
    }
}

impl Semigroup for String {
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

impl<T> Semigroup for Vec<T> {
    fn combine(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }
}

/// `None` is absorbed; two `Some` values combine their contents.
impl<T: Semigroup> Semigroup for Option<T> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(left), Some(right)) => Some(left.combine(right)),
            (Some(value), None) | (None, Some(value)) => Some(value),
            (None, None) => None,
        }
    }
}

impl Semigroup for () {
    fn combine(self, _other: Self) -> Self {}
}

impl<A: Add<Output = A>> Semigroup for Sum<A> {
    fn combine(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl<A: Mul<Output = A>> Semigroup for Product<A> {
    fn combine(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }
}

impl<A: Ord> Semigroup for Max<A> {
    fn combine(self, other: Self) -> Self {
        Self(std::cmp::max(self.0, other.0))
    }
}

impl<A: Ord> Semigroup for Min<A> {
    fn combine(self, other: Self) -> Self {
        Self(std::cmp::min(self.0, other.0))
    }
}

impl<A: Semigroup, B: Semigroup> Semigroup for (A, B) {
    fn combine(self, other: Self) -> Self {
        (self.0.combine(other.0), self.1.combine(other.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn string_combine_concatenates() {
        assert_eq!(String::from("ab").combine(String::from("cd")), "abcd");
    }

    #[rstest]
    fn vec_combine_preserves_order() {
        assert_eq!(vec![1, 2].combine(vec![3]), vec![1, 2, 3]);
    }

    #[rstest]
    #[case(Some(Sum(1)), Some(Sum(2)), Some(Sum(3)))]
    #[case(Some(Sum(1)), None, Some(Sum(1)))]
    #[case(None, Some(Sum(2)), Some(Sum(2)))]
    #[case(None, None, None)]
    fn option_combine(
        #[case] left: Option<Sum<i32>>,
        #[case] right: Option<Sum<i32>>,
        #[case] expected: Option<Sum<i32>>,
    ) {
        assert_eq!(left.combine(right), expected);
    }

    #[rstest]
    fn numeric_wrappers() {
        assert_eq!(Sum(2).combine(Sum(5)), Sum(7));
        assert_eq!(Product(2).combine(Product(5)), Product(10));
        assert_eq!(Max(2).combine(Max(5)), Max(5));
        assert_eq!(Min(2).combine(Min(5)), Min(2));
    }

    #[rstest]
    fn tuple_combines_componentwise() {
        let left = (String::from("a"), Sum(1));
        let right = (String::from("b"), Sum(2));
        assert_eq!(left.combine(right), (String::from("ab"), Sum(3)));
    }

    #[rstest]
    fn associativity_for_strings() {
        let a = String::from("x");
        let b = String::from("y");
        let c = String::from("z");
        assert_eq!(
            a.clone().combine(b.clone()).combine(c.clone()),
            a.combine(b.combine(c))
        );
    }
}

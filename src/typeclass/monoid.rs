//! Monoid type class - semigroups with an identity element.
//!
//! # Laws
//!
//! ```text
//! T::empty().combine(a) == a
//! a.combine(T::empty()) == a
//! ```
//!
//! # Examples
//!
//! ```rust
//! use effio::typeclass::{Monoid, Semigroup};
//!
//! assert_eq!(String::empty().combine(String::from("hello")), "hello");
//! ```

use std::ops::Add;

use super::semigroup::Semigroup;
use super::wrappers::{Product, Sum};

/// A type class for semigroups with an identity element.
pub trait Monoid: Semigroup {
    /// Returns the identity element for this monoid.
    fn empty() -> Self;

    /// Combines all elements in an iterator, starting from the identity element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::typeclass::Monoid;
    ///
    /// let parts = vec![String::from("a"), String::from("b")];
    /// assert_eq!(String::combine_all(parts), "ab");
    /// assert_eq!(String::combine_all(Vec::new()), "");
    /// ```
    fn combine_all<I>(iterator: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        Self: Sized,
    {
        iterator
            .into_iter()
            .fold(Self::empty(), |accumulator, element| {
                accumulator.combine(element)
            })
    }
}

impl Monoid for String {
    fn empty() -> Self {
        Self::new()
    }
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Self::new()
    }
}

impl<T: Semigroup> Monoid for Option<T> {
    fn empty() -> Self {
        None
    }
}

impl Monoid for () {
    fn empty() -> Self {}
}

impl<A: Add<Output = A> + Default> Monoid for Sum<A> {
    fn empty() -> Self {
        Self(A::default())
    }
}

macro_rules! impl_product_monoid {
    ($($numeric:ty => $one:expr),+ $(,)?) => {
        $(
            impl Monoid for Product<$numeric> {
                fn empty() -> Self {
                    Self($one)
                }
            }
        )+
    };
}

impl_product_monoid!(
    i8 => 1, i16 => 1, i32 => 1, i64 => 1, i128 => 1, isize => 1,
    u8 => 1, u16 => 1, u32 => 1, u64 => 1, u128 => 1, usize => 1,
    f32 => 1.0, f64 => 1.0,
);

impl<A: Monoid, B: Monoid> Monoid for (A, B) {
    fn empty() -> Self {
        (A::empty(), B::empty())
    }
}

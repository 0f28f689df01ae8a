//! Algebraic type classes used to fold resources together.
//!
//! - [`Semigroup`]: Types with an associative `combine`.
//! - [`Monoid`]: Semigroups with an identity element.
//! - [`Sum`], [`Product`], [`Max`], [`Min`]: Newtypes selecting one of the
//!   several lawful semigroups a numeric type has.
//!
//! # Examples
//!
//! ```rust
//! use effio::typeclass::{Monoid, Semigroup, Sum};
//!
//! assert_eq!(Sum(2).combine(Sum(3)), Sum(5));
//! assert_eq!(Vec::<i32>::empty().combine(vec![1]), vec![1]);
//! ```

mod monoid;
mod semigroup;
mod wrappers;

pub use monoid::Monoid;
pub use semigroup::Semigroup;
pub use wrappers::{Max, Min, Product, Sum};

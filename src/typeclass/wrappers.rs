//! Newtype wrappers selecting a semigroup for numeric and ordered types.
//!
//! A number combines lawfully under both addition and multiplication, and an
//! ordered type under both `max` and `min`; the wrapper names the choice.

/// Combines values by addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Sum<A>(pub A);

/// Combines values by multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Product<A>(pub A);

/// Combines values by keeping the larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Max<A>(pub A);

/// Combines values by keeping the smaller one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Min<A>(pub A);

macro_rules! impl_wrapper_accessors {
    ($($wrapper:ident),+) => {
        $(
            impl<A> $wrapper<A> {
                /// Unwraps the inner value.
                #[inline]
                pub fn into_inner(self) -> A {
                    self.0
                }
            }

            impl<A> From<A> for $wrapper<A> {
                fn from(value: A) -> Self {
                    Self(value)
                }
            }
        )+
    };
}

impl_wrapper_accessors!(Sum, Product, Max, Min);

//! Either type - the result of a computation that took one of two paths.
//!
//! `Either<L, R>` is what a race between two effects produces: `Left` when
//! the first operand won, `Right` when the second one did.
//!
//! # Examples
//!
//! ```rust
//! use effio::control::Either;
//!
//! let winner: Either<i32, String> = Either::Right("fast".to_string());
//! let description = winner.fold(|n| format!("left: {n}"), |s| format!("right: {s}"));
//! assert_eq!(description, "right: fast");
//! ```

use std::fmt;

/// A value that is either `Left(L)` or `Right(R)`.
///
/// # Type Parameters
///
/// * `L` - The type of the left value
/// * `R` - The type of the right value
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Either<L, R> {
    /// The left variant (the first operand of a race).
    Left(L),
    /// The right variant (the second operand of a race).
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Returns `true` if this is a `Left` value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::control::Either;
    ///
    /// let left: Either<i32, String> = Either::Left(42);
    /// assert!(left.is_left());
    /// ```
    #[inline]
    pub const fn is_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }

    /// Returns `true` if this is a `Right` value.
    #[inline]
    pub const fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }

    /// Converts into `Some(l)` for `Left(l)`, `None` otherwise.
    #[inline]
    pub fn left(self) -> Option<L> {
        match self {
            Self::Left(value) => Some(value),
            Self::Right(_) => None,
        }
    }

    /// Converts into `Some(r)` for `Right(r)`, `None` otherwise.
    #[inline]
    pub fn right(self) -> Option<R> {
        match self {
            Self::Left(_) => None,
            Self::Right(value) => Some(value),
        }
    }

    /// Transforms the left value, leaving a right value untouched.
    #[inline]
    pub fn map_left<T, F>(self, function: F) -> Either<T, R>
    where
        F: FnOnce(L) -> T,
    {
        match self {
            Self::Left(value) => Either::Left(function(value)),
            Self::Right(value) => Either::Right(value),
        }
    }

    /// Transforms the right value, leaving a left value untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::control::Either;
    ///
    /// let right: Either<String, i32> = Either::Right(21);
    /// assert_eq!(right.map_right(|x| x * 2), Either::Right(42));
    /// ```
    #[inline]
    pub fn map_right<T, F>(self, function: F) -> Either<L, T>
    where
        F: FnOnce(R) -> T,
    {
        match self {
            Self::Left(value) => Either::Left(value),
            Self::Right(value) => Either::Right(function(value)),
        }
    }

    /// Eliminates the `Either` by applying one of two functions.
    #[inline]
    pub fn fold<T, F, G>(self, left_function: F, right_function: G) -> T
    where
        F: FnOnce(L) -> T,
        G: FnOnce(R) -> T,
    {
        match self {
            Self::Left(value) => left_function(value),
            Self::Right(value) => right_function(value),
        }
    }
}

impl<A> Either<A, A> {
    /// Returns the inner value regardless of which side holds it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::control::Either;
    ///
    /// let left: Either<i32, i32> = Either::Left(1);
    /// let right: Either<i32, i32> = Either::Right(2);
    /// assert_eq!(left.into_inner() + right.into_inner(), 3);
    /// ```
    #[inline]
    pub fn into_inner(self) -> A {
        match self {
            Self::Left(value) | Self::Right(value) => value,
        }
    }
}

impl<L: fmt::Debug, R: fmt::Debug> fmt::Debug for Either<L, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left(value) => formatter.debug_tuple("Left").field(value).finish(),
            Self::Right(value) => formatter.debug_tuple("Right").field(value).finish(),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(value) => Self::Right(value),
            Err(error) => Self::Left(error),
        }
    }
}

//! How an effect ended.
//!
//! [`ExitCase`] is what a finalizer sees; [`Outcome`] is what the caller of a
//! run sees. Both are three-way: success, typed failure, or cancellation.

use super::error::RunError;
use super::node::{Exit, unerase};

/// The outcome of a bracketed usage, passed to its release function.
///
/// # Examples
///
/// ```rust
/// use effio::effect::ExitCase;
///
/// let case: ExitCase<String> = ExitCase::Error("boom".to_string());
/// assert!(case.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExitCase<E> {
    /// The usage completed successfully.
    Completed,
    /// The usage failed with the given error.
    Error(E),
    /// The usage was canceled.
    Canceled,
}

impl<E> ExitCase<E> {
    /// Returns `true` for [`ExitCase::Completed`].
    #[inline]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` for [`ExitCase::Error`].
    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns `true` for [`ExitCase::Canceled`].
    #[inline]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Transforms the error carried by [`ExitCase::Error`].
    pub fn map_error<E2, F>(self, function: F) -> ExitCase<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Completed => ExitCase::Completed,
            Self::Error(error) => ExitCase::Error(function(error)),
            Self::Canceled => ExitCase::Canceled,
        }
    }
}

/// The result of running an effect to completion.
///
/// Exactly one of the three variants is observed per run.
///
/// # Examples
///
/// ```rust
/// use effio::effect::{Outcome, RunError};
///
/// let outcome: Outcome<String, i32> = Outcome::Succeeded(3);
/// assert_eq!(outcome.into_result(), Ok(3));
///
/// let canceled: Outcome<String, i32> = Outcome::Canceled;
/// assert_eq!(canceled.into_result(), Err(RunError::Canceled));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome<E, A> {
    /// The effect produced a value.
    Succeeded(A),
    /// The effect failed with a typed error.
    Errored(E),
    /// The effect was canceled.
    Canceled,
}

impl<E, A> Outcome<E, A> {
    /// Returns `true` if the effect produced a value.
    #[inline]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns `true` if the effect failed with a typed error.
    #[inline]
    pub const fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }

    /// Returns `true` if the effect was canceled.
    #[inline]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Converts into a `Result`, folding cancellation into [`RunError::Canceled`].
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Failed`] for a typed failure and
    /// [`RunError::Canceled`] for a cancellation.
    pub fn into_result(self) -> Result<A, RunError<E>> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::Errored(error) => Err(RunError::Failed(error)),
            Self::Canceled => Err(RunError::Canceled),
        }
    }

    /// Transforms the success value.
    pub fn map<B, F>(self, function: F) -> Outcome<E, B>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            Self::Succeeded(value) => Outcome::Succeeded(function(value)),
            Self::Errored(error) => Outcome::Errored(error),
            Self::Canceled => Outcome::Canceled,
        }
    }

    /// The [`ExitCase`] a finalizer would observe for this outcome.
    pub fn exit_case(&self) -> ExitCase<E>
    where
        E: Clone,
    {
        match self {
            Self::Succeeded(_) => ExitCase::Completed,
            Self::Errored(error) => ExitCase::Error(error.clone()),
            Self::Canceled => ExitCase::Canceled,
        }
    }
}

impl<E: 'static, A: 'static> Outcome<E, A> {
    pub(crate) fn from_exit(exit: Exit) -> Self {
        match exit {
            Exit::Succeeded(value) => Self::Succeeded(unerase(value)),
            Exit::Errored(error) => Self::Errored(unerase(error)),
            Exit::Canceled => Self::Canceled,
        }
    }
}

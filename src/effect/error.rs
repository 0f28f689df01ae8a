//! Error types surfaced by running effects.
//!
//! Typed domain failures travel in the `E` channel of an [`Effect`](super::Effect)
//! and never need these types. They describe what happens at the edges: a
//! run that did not succeed, or a deadline that elapsed.

use std::time::Duration;

use thiserror::Error;

/// Error produced when an effect does not complete within its deadline.
///
/// Used by [`Effect::timeout`](super::Effect::timeout), which requires the
/// effect's failure type to implement `From<TimeoutError>`.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use effio::effect::TimeoutError;
///
/// let error = TimeoutError {
///     duration: Duration::from_millis(250),
/// };
/// assert_eq!(error.to_string(), "effect timed out after 250ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("effect timed out after {duration:?}")]
pub struct TimeoutError {
    /// The deadline that elapsed.
    pub duration: Duration,
}

/// The non-successful result of a run, as returned by
/// [`Outcome::into_result`](super::Outcome::into_result).
///
/// # Examples
///
/// ```rust
/// use effio::effect::RunError;
///
/// let failed: RunError<String> = RunError::Failed("disk full".to_string());
/// assert_eq!(failed.to_string(), "effect failed: disk full");
/// assert_eq!(RunError::<String>::Canceled.to_string(), "effect was canceled");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError<E> {
    /// The effect failed with a typed error.
    #[error("effect failed: {0}")]
    Failed(E),
    /// The effect was canceled before it could complete.
    #[error("effect was canceled")]
    Canceled,
}

impl<E> RunError<E> {
    /// Returns the typed failure, or `None` for a cancellation.
    pub fn failure(self) -> Option<E> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Canceled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn timeout_error_display_includes_duration() {
        let error = TimeoutError {
            duration: Duration::from_secs(2),
        };
        assert_eq!(error.to_string(), "effect timed out after 2s");
    }

    #[rstest]
    #[case(RunError::Failed(7), Some(7))]
    #[case(RunError::Canceled, None)]
    fn run_error_failure(#[case] error: RunError<i32>, #[case] expected: Option<i32>) {
        assert_eq!(error.failure(), expected);
    }

    #[rstest]
    fn run_error_is_std_error() {
        fn assert_error<T: std::error::Error>(_: &T) {}
        assert_error(&RunError::Failed(TimeoutError {
            duration: Duration::from_millis(1),
        }));
    }
}

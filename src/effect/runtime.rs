//! Runtimes that drive effects.
//!
//! This module owns a lazily created multi-thread tokio runtime shared by
//! every run that is not already inside a runtime, plus helpers to run an
//! effect to completion from synchronous code.
//!
//! # Runtime Flavor Considerations
//!
//! - **Multi-thread runtime**: [`try_run_blocking`] uses `block_in_place`
//!   with the current handle.
//! - **Current-thread runtime**: [`try_run_blocking`] returns
//!   [`BlockingError::CurrentThreadRuntime`], since `block_in_place` is not
//!   supported there.
//! - **Outside any runtime**: the global runtime's `block_on` is used.
//!
//! # Examples
//!
//! ```rust
//! use effio::effect::{Effect, Outcome, runtime};
//!
//! let effect: Effect<String, i32> = Effect::delay(|| 6 * 7);
//! assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(42));
//! ```

use std::cell::RefCell;
use std::future::IntoFuture;
use std::sync::LazyLock;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

const DEFAULT_THREAD_NAME: &str = "effio-worker";

// =============================================================================
// Configuration
// =============================================================================

/// Builder-style configuration for a multi-thread runtime.
///
/// # Examples
///
/// ```rust
/// use effio::effect::runtime::RuntimeConfig;
///
/// let runtime = RuntimeConfig::default()
///     .with_worker_threads(2)
///     .with_thread_name("io-pool")
///     .build()
///     .unwrap();
/// assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    worker_threads: usize,
    thread_name: String,
}

impl RuntimeConfig {
    /// Sets the number of worker threads. Zero is treated as one.
    #[must_use]
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }

    /// Sets the name given to worker threads.
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// The configured number of worker threads.
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// The configured worker thread name.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Builds a multi-thread runtime with all drivers enabled.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by tokio when the runtime cannot be
    /// created.
    pub fn build(&self) -> std::io::Result<Runtime> {
        Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name(self.thread_name.clone())
            .enable_all()
            .build()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(1),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

// =============================================================================
// Global Runtime
// =============================================================================

/// Global runtime initialized lazily on first access with the default
/// [`RuntimeConfig`]. It is never dropped.
static GLOBAL_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    RuntimeConfig::default()
        .build()
        .expect("Failed to create global effio runtime")
});

/// Returns a reference to the global runtime.
#[inline]
#[must_use]
pub fn global() -> &'static Runtime {
    &GLOBAL_RUNTIME
}

thread_local! {
    static CACHED_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Returns a handle to the current runtime, or to the global runtime when
/// called outside of one.
///
/// The global handle is cached per thread.
#[inline]
#[must_use]
pub fn handle() -> Handle {
    if let Ok(current_handle) = Handle::try_current() {
        return current_handle;
    }

    CACHED_HANDLE.with(|cached| {
        cached
            .borrow_mut()
            .get_or_insert_with(|| global().handle().clone())
            .clone()
    })
}

// =============================================================================
// Blocking Execution
// =============================================================================

/// Error returned when [`try_run_blocking`] cannot block the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockingError {
    /// `block_in_place` is not supported in a current-thread runtime.
    #[error(
        "cannot execute blocking operation in current-thread runtime: \
         block_in_place is only supported in multi-thread runtimes"
    )]
    CurrentThreadRuntime,

    /// The enclosing runtime has a flavor this module does not know.
    #[error(
        "cannot execute blocking operation: \
         the runtime flavor is not supported for blocking execution"
    )]
    UnsupportedRuntimeFlavor,
}

/// Runs an effect (or any future) to completion, blocking the current thread.
///
/// # Errors
///
/// Returns [`BlockingError::CurrentThreadRuntime`] when called from inside a
/// current-thread runtime and [`BlockingError::UnsupportedRuntimeFlavor`] for
/// runtime flavors other than multi-thread.
///
/// # Examples
///
/// ```rust
/// use effio::effect::{Effect, Outcome, runtime::try_run_blocking};
///
/// let effect: Effect<String, i32> = Effect::fail("nope".to_string());
/// assert_eq!(
///     try_run_blocking(effect),
///     Ok(Outcome::Errored("nope".to_string()))
/// );
/// ```
pub fn try_run_blocking<F>(future: F) -> Result<F::Output, BlockingError>
where
    F: IntoFuture,
{
    if let Ok(current_handle) = Handle::try_current() {
        match current_handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => Ok(tokio::task::block_in_place(|| {
                current_handle.block_on(future.into_future())
            })),
            RuntimeFlavor::CurrentThread => Err(BlockingError::CurrentThreadRuntime),
            _ => Err(BlockingError::UnsupportedRuntimeFlavor),
        }
    } else {
        Ok(global().block_on(future.into_future()))
    }
}

/// Runs an effect (or any future) to completion, blocking the current thread.
///
/// # Panics
///
/// Panics if called from within a current-thread runtime, or if the future
/// panics.
pub fn run_blocking<F>(future: F) -> F::Output
where
    F: IntoFuture,
{
    match try_run_blocking(future) {
        Ok(output) => output,
        Err(error) => panic!("run_blocking failed: {error}"),
    }
}

//! Lazy, typed effects and the runtime that interprets them.
//!
//! An [`Effect<E, A>`] describes a computation that may succeed with `A`,
//! fail with `E`, suspend on asynchronous work, or be canceled. Effects are
//! built by composition and only do something when run.
//!
//! # Building Blocks
//!
//! - Construction: [`Effect::succeed`], [`Effect::fail`], [`Effect::delay`],
//!   [`Effect::suspend`], [`Effect::async_callback`], [`Effect::from_future`]
//! - Sequencing: [`Effect::map`], [`Effect::flat_map`],
//!   [`Effect::handle_error_with`]
//! - Finalizers: [`Effect::bracket_case`] and the combinators derived from it
//! - Concurrency: [`Effect::race`], [`Effect::par_map`], [`par_map2`] through
//!   [`par_map9`], [`Effect::continue_on`]
//! - Running: [`Effect::run`] (or `.await`), [`Effect::start`],
//!   [`Effect::run_async`], [`runtime::run_blocking`]
//!
//! # Cancellation
//!
//! Cancellation is observed at suspension points. When it is observed,
//! every resource already acquired is released with [`ExitCase::Canceled`]
//! and the run ends with [`Outcome::Canceled`].
//!
//! # Examples
//!
//! ```rust
//! use effio::effect::{Effect, ExitCase, Outcome, runtime};
//!
//! let effect: Effect<String, usize> = Effect::succeed("config.toml".to_string())
//!     .bracket_case(
//!         |_path, case: ExitCase<String>| {
//!             assert!(case.is_completed());
//!             Effect::unit()
//!         },
//!         |path| Effect::delay(move || path.len()),
//!     );
//!
//! assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(11));
//! ```

mod callback;
mod cancel;
mod context;
mod error;
mod exit;
mod fiber;
mod interpreter;
mod io;
pub(crate) mod node;
mod parallel;
pub mod runtime;

pub use callback::Callback;
pub use cancel::{CancelToken, DropGuard};
pub use context::ExecutionContext;
pub use error::{RunError, TimeoutError};
pub use exit::{ExitCase, Outcome};
pub use fiber::{Fiber, Run};
pub use io::Effect;
#[cfg(feature = "resource")]
pub(crate) use io::bracket_node;
pub use parallel::{
    par_map2, par_map3, par_map4, par_map5, par_map6, par_map7, par_map8, par_map9,
    par_sequence, par_traverse, par_tupled2, par_tupled3, par_tupled4, par_tupled5,
    par_tupled6, par_tupled7, par_tupled8, par_tupled9,
};
pub use runtime::{BlockingError, RuntimeConfig};

static_assertions::assert_impl_all!(Effect<String, i32>: Send);
static_assertions::assert_not_impl_any!(Effect<String, i32>: Sync, Clone);
static_assertions::assert_impl_all!(Run<String, i32>: Send);
static_assertions::assert_impl_all!(Fiber<String, i32>: Send, Sync);
static_assertions::assert_impl_all!(CancelToken: Send, Sync, Clone);
static_assertions::assert_impl_all!(ExecutionContext: Send, Sync, Clone);
static_assertions::assert_impl_all!(Callback<String, i32>: Send, Sync, Clone);

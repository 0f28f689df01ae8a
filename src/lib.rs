//! # effio
//!
//! A small effect runtime for composing deferred computations that may fail,
//! run asynchronously, be cancelled, or allocate and release resources, with
//! safe concurrent mutable state.
//!
//! ## Overview
//!
//! - **Effect**: A lazy, typed description of a computation with an explicit
//!   failure channel. Nothing runs until the effect is run.
//! - **Bracket**: Acquire/use/release with finalizers that always run, and
//!   observe whether the usage completed, failed, or was cancelled.
//! - **Race / Parallel**: Concurrent composition with loser cancellation and
//!   positional result combination.
//! - **Ref**: A concurrent mutable cell driven by compare-and-swap, whose
//!   operations are themselves effects.
//! - **Resource**: Composable acquire/release pairs released in strict LIFO
//!   order.
//!
//! ## Feature Flags
//!
//! - `typeclass`: `Semigroup` and `Monoid`
//! - `control`: `Either`
//! - `effect`: The effect interpreter and its runtime
//! - `concurrent`: `AtomicCell` and `Ref`
//! - `resource`: `Resource`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use effio::effect::{Effect, Outcome, runtime};
//!
//! let effect: Effect<String, i32> = Effect::succeed(20)
//!     .map(|x| x + 1)
//!     .flat_map(|x| Effect::succeed(x * 2));
//!
//! assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(42));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use effio::prelude::*;
/// ```
pub mod prelude {

    #[cfg(feature = "typeclass")]
    pub use crate::typeclass::*;

    #[cfg(feature = "control")]
    pub use crate::control::*;

    #[cfg(feature = "effect")]
    pub use crate::effect::*;

    #[cfg(feature = "concurrent")]
    pub use crate::concurrent::*;

    #[cfg(feature = "resource")]
    pub use crate::resource::*;
}

#[cfg(feature = "typeclass")]
pub mod typeclass;

#[cfg(feature = "control")]
pub mod control;

#[cfg(feature = "effect")]
pub mod effect;

#[cfg(feature = "concurrent")]
pub mod concurrent;

#[cfg(feature = "resource")]
pub mod resource;

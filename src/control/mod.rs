//! Control structures shared by the effect runtime.
//!
//! - [`Either`]: The outcome of a two-way choice, produced by racing effects.
//!
//! # Examples
//!
//! ```rust
//! use effio::control::Either;
//!
//! let winner: Either<&str, i32> = Either::Left("first");
//! assert!(winner.is_left());
//! ```

mod either;

pub use either::Either;

//! Concurrent mutable state.
//!
//! - [`AtomicCell`]: A single slot updated by compare-and-swap over
//!   generation-tagged values.
//! - [`Ref`]: A shared cell whose operations are [`Effect`](crate::effect::Effect)s.
//! - [`Setter`]: The single-use setter returned by [`Ref::access`].
//!
//! These are the only shared-mutation primitives of the crate. No lock is
//! exposed to callers; concurrent writers coordinate through retry loops.

mod atomic_cell;
mod ref_cell;

pub use atomic_cell::{AtomicCell, ContentionPolicy, Snapshot};
pub use ref_cell::{Ref, Setter};

static_assertions::assert_impl_all!(AtomicCell<i32>: Send, Sync);
static_assertions::assert_impl_all!(Ref<String>: Send, Sync, Clone);
static_assertions::assert_impl_all!(Setter<String>: Send, Sync, Clone);

//! Ref - a concurrent mutable cell whose operations are effects.
//!
//! Every operation returns an [`Effect`]; nothing touches the cell until the
//! effect runs. Updates use the optimistic retry loop of [`AtomicCell`]:
//! load, compute, compare-and-swap, and retry from a fresh load if another
//! writer got there first. Update functions may therefore run more than
//! once and must be free of side effects.
//!
//! # Examples
//!
//! ```rust
//! use effio::concurrent::Ref;
//! use effio::effect::{Effect, Outcome, runtime};
//!
//! let program: Effect<String, i32> = Ref::of(10).flat_map(|counter: Ref<i32>| {
//!     counter
//!         .update(|n| n + 5)
//!         .then(counter.modify(|n| (n * 2, n)))
//! });
//! assert_eq!(runtime::run_blocking(program), Outcome::Succeeded(15));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::atomic_cell::{AtomicCell, ContentionPolicy, Snapshot};
use crate::effect::Effect;

/// A shared, concurrently mutable reference to an `A`.
///
/// Cloning a `Ref` yields another handle to the same cell.
pub struct Ref<A> {
    cell: Arc<AtomicCell<A>>,
}

impl<A> Clone for Ref<A> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Ref<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Ref").field(&*self.cell.load()).finish()
    }
}

impl<A> Ref<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Creates a cell directly, outside of any effect.
    pub fn new(initial: A) -> Self {
        Self::with_policy(initial, ContentionPolicy::default())
    }

    /// Creates a cell with the given retry policy.
    pub fn with_policy(initial: A, policy: ContentionPolicy) -> Self {
        Self {
            cell: Arc::new(AtomicCell::with_policy(initial, policy)),
        }
    }

    /// An effect that allocates a new cell each time it runs.
    pub fn of<E: Send + 'static>(initial: A) -> Effect<E, Self> {
        Effect::delay(move || Self::new(initial))
    }

    /// Reads the current value.
    pub fn get<E: Send + 'static>(&self) -> Effect<E, A> {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || cell.load().value().clone())
    }

    /// Replaces the value.
    pub fn set<E: Send + 'static>(&self, value: A) -> Effect<E, ()> {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || cell.store(value))
    }

    /// Replaces the value, returning the previous one.
    pub fn get_and_set<E: Send + 'static>(&self, value: A) -> Effect<E, A> {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || cell.swap(value).as_ref().clone())
    }

    /// Replaces the value, returning the new one.
    pub fn set_and_get<E: Send + 'static>(&self, value: A) -> Effect<E, A> {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || {
            cell.store(value.clone());
            value
        })
    }

    /// Applies `function` atomically, retrying on contention.
    pub fn update<E, F>(&self, mut function: F) -> Effect<E, ()>
    where
        E: Send + 'static,
        F: FnMut(A) -> A + Send + 'static,
    {
        self.modify(move |value| (function(value), ()))
    }

    /// Applies `function` atomically, returning the previous value.
    pub fn get_and_update<E, F>(&self, mut function: F) -> Effect<E, A>
    where
        E: Send + 'static,
        F: FnMut(A) -> A + Send + 'static,
    {
        self.modify(move |value| (function(value.clone()), value))
    }

    /// Applies `function` atomically, returning the new value.
    pub fn update_and_get<E, F>(&self, mut function: F) -> Effect<E, A>
    where
        E: Send + 'static,
        F: FnMut(A) -> A + Send + 'static,
    {
        self.modify(move |value| {
            let next = function(value);
            (next.clone(), next)
        })
    }

    /// Applies `function` atomically and returns its side output.
    ///
    /// The load-compute-swap loop retries without bound, so heavy contention
    /// on one cell can starve a writer. [`update_bounded`](Self::update_bounded)
    /// caps the attempts.
    pub fn modify<E, B, F>(&self, mut function: F) -> Effect<E, B>
    where
        E: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> (A, B) + Send + 'static,
    {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || cell.modify(|value| function(value.clone())))
    }

    /// Makes a single update attempt; `false` means another writer won.
    pub fn try_update<E, F>(&self, function: F) -> Effect<E, bool>
    where
        E: Send + 'static,
        F: FnOnce(A) -> A + Send + 'static,
    {
        self.try_modify(move |value| (function(value), ()))
            .map(|updated| updated.is_some())
    }

    /// Makes a single modify attempt; `None` means another writer won.
    pub fn try_modify<E, B, F>(&self, function: F) -> Effect<E, Option<B>>
    where
        E: Send + 'static,
        B: Send + 'static,
        F: FnOnce(A) -> (A, B) + Send + 'static,
    {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || cell.try_modify(|value| function(value.clone())))
    }

    /// Like [`update`](Self::update), giving up after `max_attempts`.
    pub fn update_bounded<E, F>(&self, mut function: F, max_attempts: u32) -> Effect<E, bool>
    where
        E: Send + 'static,
        F: FnMut(A) -> A + Send + 'static,
    {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || {
            cell.modify_bounded(|value| (function(value.clone()), ()), max_attempts)
                .is_some()
        })
    }

    /// Reads a snapshot together with a single-use setter for it.
    ///
    /// The setter succeeds only if the cell still holds the snapshot and it
    /// has never been used before.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::concurrent::Ref;
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// let cell = Ref::new(1);
    /// let program: Effect<String, (bool, bool)> = cell.access().flat_map(|(value, setter)| {
    ///     setter.set(value + 1).product(setter.set(value + 2))
    /// });
    /// assert_eq!(runtime::run_blocking(program), Outcome::Succeeded((true, false)));
    /// ```
    pub fn access<E: Send + 'static>(&self) -> Effect<E, (A, Setter<A>)> {
        let cell = Arc::clone(&self.cell);
        Effect::delay(move || {
            let snapshot = cell.load();
            let value = snapshot.value().clone();
            let setter = Setter {
                cell,
                snapshot,
                used: Arc::new(AtomicBool::new(false)),
            };
            (value, setter)
        })
    }
}

/// The setter returned by [`Ref::access`].
///
/// Clones share one use: after any clone has been invoked, every further
/// invocation reports `false`.
pub struct Setter<A> {
    cell: Arc<AtomicCell<A>>,
    snapshot: Snapshot<A>,
    used: Arc<AtomicBool>,
}

impl<A> Clone for Setter<A> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            snapshot: self.snapshot.clone(),
            used: Arc::clone(&self.used),
        }
    }
}

impl<A> fmt::Debug for Setter<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Setter")
            .field("generation", &self.snapshot.generation())
            .field("used", &self.used.load(Ordering::Acquire))
            .finish()
    }
}

impl<A> Setter<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Attempts to replace the snapshot with `value`.
    pub fn set<E: Send + 'static>(&self, value: A) -> Effect<E, bool> {
        let setter = self.clone();
        Effect::delay(move || {
            if setter.used.swap(true, Ordering::AcqRel) {
                return false;
            }
            setter.cell.compare_and_swap(&setter.snapshot, value).is_ok()
        })
    }
}

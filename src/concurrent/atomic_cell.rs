//! A single-slot cell updated by compare-and-swap.
//!
//! # Design
//!
//! Every stored value gets a fresh generation number. The visible value is
//! the one whose generation is held by an `AtomicU64`; values live in a
//! generation-indexed arena. A swap inserts the candidate under a new
//! generation, then moves the atomic word from the expected generation to
//! the new one. Generations are never reused, so a stale snapshot can never
//! succeed by accident (no ABA), and no unsafe code is needed.
//!
//! # Memory Ordering
//!
//! Successful swaps use `AcqRel`; loads and failed swaps use `Acquire`. A
//! value written by a successful swap is visible to every load that observes
//! its generation.
//!
//! # Examples
//!
//! ```rust
//! use effio::concurrent::AtomicCell;
//!
//! let cell = AtomicCell::new(1);
//! let snapshot = cell.load();
//! assert!(cell.compare_and_swap(&snapshot, 2).is_ok());
//! // The old snapshot is stale now.
//! assert!(cell.compare_and_swap(&snapshot, 3).is_err());
//! assert_eq!(*cell.load(), 2);
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// What a retry loop does between failed attempts.
///
/// Update loops are optimistic: under pathological contention they can retry
/// indefinitely (livelock). The policy only shapes how eagerly they retry;
/// use a bounded operation to cap the number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentionPolicy {
    /// Retry immediately after a CPU spin hint.
    #[default]
    Spin,
    /// Yield the thread to the scheduler before retrying.
    Yield,
    /// Spin an exponentially growing number of times, capped at `max_spins`.
    Backoff {
        /// Upper bound on spins between two attempts.
        max_spins: u32,
    },
}

impl ContentionPolicy {
    /// Waits according to the policy after `attempt` failed attempts.
    pub(crate) fn pause(self, attempt: u32) {
        match self {
            Self::Spin => std::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
            Self::Backoff { max_spins } => {
                let spins = (1_u32 << attempt.min(16)).min(max_spins.max(1));
                for _ in 0..spins {
                    std::hint::spin_loop();
                }
            }
        }
    }
}

/// A value observed in an [`AtomicCell`], tagged with its generation.
pub struct Snapshot<A> {
    generation: u64,
    value: Arc<A>,
}

impl<A> Snapshot<A> {
    /// The generation of the observed value.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The observed value.
    #[must_use]
    pub fn value(&self) -> &A {
        &self.value
    }

    /// A shared handle to the observed value.
    #[must_use]
    pub fn shared(&self) -> Arc<A> {
        Arc::clone(&self.value)
    }
}

impl<A> Clone for Snapshot<A> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            value: Arc::clone(&self.value),
        }
    }
}

impl<A> Deref for Snapshot<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.value
    }
}

impl<A: fmt::Debug> fmt::Debug for Snapshot<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Snapshot")
            .field("generation", &self.generation)
            .field("value", &self.value)
            .finish()
    }
}

/// A concurrently mutable slot supporting compare-and-swap.
pub struct AtomicCell<A> {
    current: AtomicU64,
    next_generation: AtomicU64,
    slots: RwLock<FxHashMap<u64, Arc<A>>>,
    policy: ContentionPolicy,
}

impl<A> AtomicCell<A> {
    /// Creates a cell holding `value`, retrying with [`ContentionPolicy::Spin`].
    pub fn new(value: A) -> Self {
        Self::with_policy(value, ContentionPolicy::default())
    }

    /// Creates a cell holding `value` with the given retry policy.
    pub fn with_policy(value: A, policy: ContentionPolicy) -> Self {
        let mut slots = FxHashMap::default();
        slots.insert(0, Arc::new(value));
        Self {
            current: AtomicU64::new(0),
            next_generation: AtomicU64::new(1),
            slots: RwLock::new(slots),
            policy,
        }
    }

    /// The retry policy used by [`modify`](Self::modify).
    pub const fn policy(&self) -> ContentionPolicy {
        self.policy
    }

    /// Observes the current value.
    pub fn load(&self) -> Snapshot<A> {
        loop {
            let generation = self.current.load(Ordering::Acquire);
            if let Some(value) = self.slots.read().get(&generation) {
                return Snapshot {
                    generation,
                    value: Arc::clone(value),
                };
            }
            // Replaced and retired between the two reads.
            std::hint::spin_loop();
        }
    }

    fn stage(&self, value: A) -> (u64, Arc<A>) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(value);
        self.slots.write().insert(generation, Arc::clone(&value));
        (generation, value)
    }

    /// Replaces the value with `value` if it is still the one in `expected`.
    ///
    /// # Errors
    ///
    /// Returns a fresh snapshot when another writer replaced the value since
    /// `expected` was observed.
    pub fn compare_and_swap(&self, expected: &Snapshot<A>, value: A) -> Result<Snapshot<A>, Snapshot<A>> {
        let (generation, value) = self.stage(value);
        match self.current.compare_exchange(
            expected.generation,
            generation,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(previous) => {
                self.slots.write().remove(&previous);
                Ok(Snapshot { generation, value })
            }
            Err(_) => {
                self.slots.write().remove(&generation);
                Err(self.load())
            }
        }
    }

    /// Unconditionally replaces the value, returning the previous one.
    pub fn swap(&self, value: A) -> Arc<A> {
        let (generation, _) = self.stage(value);
        let previous = self.current.swap(generation, Ordering::AcqRel);
        match self.slots.write().remove(&previous) {
            Some(previous) => previous,
            None => panic!("effio internal error: visible generation missing from the arena"),
        }
    }

    /// Unconditionally replaces the value.
    pub fn store(&self, value: A) {
        drop(self.swap(value));
    }

    /// Makes one load-compute-swap attempt.
    ///
    /// Returns `None` if another writer won the race.
    pub fn try_modify<B, F>(&self, function: F) -> Option<B>
    where
        F: FnOnce(&A) -> (A, B),
    {
        let snapshot = self.load();
        let (next, output) = function(&snapshot);
        self.compare_and_swap(&snapshot, next).ok().map(|_| output)
    }

    /// Applies `function` until its result is swapped in, then returns the
    /// side output.
    ///
    /// `function` may run several times and must be free of side effects.
    /// Retries are unbounded; see [`ContentionPolicy`].
    pub fn modify<B, F>(&self, mut function: F) -> B
    where
        F: FnMut(&A) -> (A, B),
    {
        let mut attempt = 0_u32;
        loop {
            if let Some(output) = self.try_modify(&mut function) {
                return output;
            }
            attempt = attempt.saturating_add(1);
            tracing::trace!(attempt, "compare-and-swap lost a race; retrying");
            self.policy.pause(attempt);
        }
    }

    /// Like [`modify`](Self::modify), giving up after `max_attempts` attempts.
    pub fn modify_bounded<B, F>(&self, mut function: F, max_attempts: u32) -> Option<B>
    where
        F: FnMut(&A) -> (A, B),
    {
        for attempt in 1..=max_attempts {
            if let Some(output) = self.try_modify(&mut function) {
                return Some(output);
            }
            tracing::trace!(attempt, max_attempts, "compare-and-swap lost a race");
            self.policy.pause(attempt);
        }
        None
    }
}

impl<A: Default> Default for AtomicCell<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<A: fmt::Debug> fmt::Debug for AtomicCell<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AtomicCell")
            .field("value", &self.load().value)
            .field("policy", &self.policy)
            .finish()
    }
}

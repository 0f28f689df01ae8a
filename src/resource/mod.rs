//! Resource - composable acquire/release pairs.
//!
//! A [`Resource<E, A>`] describes how to acquire an `A` and how to release
//! it. It is only consumed through [`Resource::use_resource`], which acquires,
//! runs the body, and releases, all inside one
//! [`Effect::bracket_case`](crate::effect::Effect::bracket_case).
//!
//! Chained resources release in strict reverse order of acquisition, exactly
//! once, and every release observes the [`ExitCase`] of the overall usage.
//! If a later acquisition fails, every earlier resource is still released.
//!
//! Resources are reusable descriptions: each use acquires afresh.
//!
//! # Examples
//!
//! ```rust
//! use effio::effect::{Effect, Outcome, runtime};
//! use effio::resource::Resource;
//! use std::sync::{Arc, Mutex};
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let open = |name: &'static str, log: Arc<Mutex<Vec<String>>>| {
//!     let on_release = Arc::clone(&log);
//!     Resource::make(
//!         move || {
//!             let log = Arc::clone(&log);
//!             Effect::<String, &'static str>::delay(move || {
//!                 log.lock().unwrap().push(format!("open {name}"));
//!                 name
//!             })
//!         },
//!         move |name, _case| {
//!             let log = Arc::clone(&on_release);
//!             Effect::delay(move || log.lock().unwrap().push(format!("close {name}")))
//!         },
//!     )
//! };
//!
//! let first = open("db", Arc::clone(&log));
//! let second = open("cache", Arc::clone(&log));
//! let both = first.flat_map(move |db| second.clone().map(move |cache| (db, cache)));
//!
//! let outcome = runtime::run_blocking(both.use_resource(|(db, cache)| {
//!     Effect::succeed(format!("{db}+{cache}"))
//! }));
//!
//! assert_eq!(outcome, Outcome::Succeeded("db+cache".to_string()));
//! assert_eq!(
//!     *log.lock().unwrap(),
//!     vec!["open db", "open cache", "close cache", "close db"]
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use crate::effect::node::Node;
use crate::effect::{Effect, ExitCase, bracket_node};
use crate::typeclass::{Monoid, Semigroup};

/// The continuation a resource hands its value to.
type Body<A> = Box<dyn FnOnce(A) -> Node + Send>;

type AcquireFn<E, A> = Arc<dyn Fn() -> Effect<E, A> + Send + Sync>;
type ReleaseFn<E, A> = Arc<dyn Fn(A, ExitCase<E>) -> Effect<E, ()> + Send + Sync>;

/// Runs a body with an acquired value, releasing it afterwards.
trait Allocate<E, A>: Send + Sync {
    fn use_with(&self, body: Body<A>) -> Node;
}

/// A description of how to acquire and release an `A`.
pub struct Resource<E, A> {
    inner: Arc<dyn Allocate<E, A>>,
}

impl<E, A> Clone for Resource<E, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, A> fmt::Debug for Resource<E, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Resource(<deferred>)")
    }
}

// =============================================================================
// Allocation Strategies
// =============================================================================

struct Leaf<E, A> {
    acquire: AcquireFn<E, A>,
    release: ReleaseFn<E, A>,
}

impl<E, A> Allocate<E, A> for Leaf<E, A>
where
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
{
    fn use_with(&self, body: Body<A>) -> Node {
        let release = Arc::clone(&self.release);
        bracket_node(
            (self.acquire)(),
            move |resource, case| release(resource, case),
            body,
        )
    }
}

struct Mapped<E, A, B> {
    source: Resource<E, A>,
    function: Arc<dyn Fn(A) -> B + Send + Sync>,
}

impl<E, A, B> Allocate<E, B> for Mapped<E, A, B>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    fn use_with(&self, body: Body<B>) -> Node {
        let function = Arc::clone(&self.function);
        self.source
            .inner
            .use_with(Box::new(move |value| body(function(value))))
    }
}

struct Bound<E, A, B> {
    source: Resource<E, A>,
    function: Arc<dyn Fn(A) -> Resource<E, B> + Send + Sync>,
}

impl<E, A, B> Allocate<E, B> for Bound<E, A, B>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    // The inner use runs inside the outer one, so the inner release
    // finishes before the outer release starts.
    fn use_with(&self, body: Body<B>) -> Node {
        let function = Arc::clone(&self.function);
        self.source
            .inner
            .use_with(Box::new(move |value| function(value).inner.use_with(body)))
    }
}

// =============================================================================
// Construction
// =============================================================================

impl<E, A> Resource<E, A>
where
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
{
    /// Builds a resource from an acquisition and its release.
    ///
    /// `acquire` is called once per use. `release` receives the acquired
    /// value and how the usage ended.
    pub fn make<Acq, Rel>(acquire: Acq, release: Rel) -> Self
    where
        Acq: Fn() -> Effect<E, A> + Send + Sync + 'static,
        Rel: Fn(A, ExitCase<E>) -> Effect<E, ()> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Leaf {
                acquire: Arc::new(acquire),
                release: Arc::new(release),
            }),
        }
    }

    /// A resource whose acquisition needs no release.
    pub fn eval<Acq>(acquire: Acq) -> Self
    where
        Acq: Fn() -> Effect<E, A> + Send + Sync + 'static,
    {
        Self::make(acquire, |_, _| Effect::unit())
    }

    /// A resource that yields `value` and releases nothing.
    pub fn pure(value: A) -> Self
    where
        A: Sync,
    {
        Self::eval(move || Effect::succeed(value.clone()))
    }
}

// =============================================================================
// Composition and Use
// =============================================================================

impl<E, A> Resource<E, A>
where
    E: Send + 'static,
    A: Send + 'static,
{
    /// Acquires the resource, runs `body` with it, and releases it.
    pub fn use_resource<B, F>(&self, body: F) -> Effect<E, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Effect<E, B> + Send + 'static,
    {
        Effect::from_node(
            self.inner
                .use_with(Box::new(move |value| body(value).into_node())),
        )
    }

    /// Transforms the acquired value without acquiring anything new.
    pub fn map<B, F>(self, function: F) -> Resource<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Resource {
            inner: Arc::new(Mapped {
                source: self,
                function: Arc::new(function),
            }),
        }
    }

    /// Acquires a second resource that depends on the first.
    ///
    /// The second is released before the first.
    pub fn flat_map<B, F>(self, function: F) -> Resource<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Resource<E, B> + Send + Sync + 'static,
    {
        Resource {
            inner: Arc::new(Bound {
                source: self,
                function: Arc::new(function),
            }),
        }
    }
}

/// Acquires both resources in order and combines their values.
impl<E, A> Semigroup for Resource<E, A>
where
    E: Send + 'static,
    A: Semigroup + Clone + Send + Sync + 'static,
{
    fn combine(self, other: Self) -> Self {
        self.flat_map(move |first| {
            other
                .clone()
                .map(move |second| first.clone().combine(second))
        })
    }
}

impl<E, A> Monoid for Resource<E, A>
where
    E: Clone + Send + 'static,
    A: Monoid + Clone + Send + Sync + 'static,
{
    fn empty() -> Self {
        Self::pure(A::empty())
    }
}

static_assertions::assert_impl_all!(Resource<String, i32>: Send, Sync, Clone);

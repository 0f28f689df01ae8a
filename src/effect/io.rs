//! Effect - a lazy, typed description of a computation.
//!
//! `Effect<E, A>` describes a computation that may succeed with an `A`, fail
//! with an `E`, suspend on asynchronous work, or be canceled. Building an
//! effect performs no side effects; running it performs them once per run.
//!
//! # Examples
//!
//! ```rust
//! use effio::effect::{Effect, Outcome, runtime};
//!
//! let effect: Effect<String, i32> = Effect::succeed(10)
//!     .map(|x| x * 2)
//!     .flat_map(|x| Effect::succeed(x + 1));
//! assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(21));
//! ```
//!
//! # Side Effect Deferral
//!
//! ```rust
//! use effio::effect::{Effect, runtime};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&runs);
//! let effect: Effect<String, ()> = Effect::delay(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert_eq!(runs.load(Ordering::SeqCst), 0);
//! runtime::run_blocking(effect);
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::time::Duration;

use super::callback::Callback;
use super::cancel::CancelToken;
use super::context::ExecutionContext;
use super::error::TimeoutError;
use super::exit::{ExitCase, Outcome};
use super::fiber::{Fiber, Run};
use super::node::{BracketNode, Child, Erased, Exit, Node, ReleaseFn, erase, unerase, unerase_ref};
use crate::control::Either;

/// A lazy description of a computation that fails with `E` or succeeds
/// with `A`.
///
/// Effects are consumed by running them. To run the same computation twice,
/// build it twice (for example from a closure).
#[must_use = "effects do nothing unless run"]
pub struct Effect<E, A> {
    node: Node,
    _marker: PhantomData<fn() -> (E, A)>,
}

impl<E, A> Effect<E, A> {
    #[inline]
    pub(crate) const fn from_node(node: Node) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn into_node(self) -> Node {
        self.node
    }
}

impl<E, A> fmt::Debug for Effect<E, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Effect(<deferred>)")
    }
}

// =============================================================================
// Construction
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// An effect that succeeds with `value` without doing any work.
    pub fn succeed(value: A) -> Self {
        Self::from_node(Node::Pure(erase(value)))
    }

    /// Alias for [`succeed`](Self::succeed).
    pub fn pure(value: A) -> Self {
        Self::succeed(value)
    }

    /// An effect that fails with `error` without doing any work.
    pub fn fail(error: E) -> Self {
        Self::from_node(Node::Fail(erase(error)))
    }

    /// Lifts a `Result` into an effect.
    pub fn from_result(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::succeed(value),
            Err(error) => Self::fail(error),
        }
    }

    /// Defers an infallible side effect until the effect is run.
    pub fn delay<F>(thunk: F) -> Self
    where
        F: FnOnce() -> A + Send + 'static,
    {
        Self::from_node(Node::Suspend(Box::new(move || Node::Pure(erase(thunk())))))
    }

    /// Defers a fallible side effect until the effect is run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// let parsed: Effect<std::num::ParseIntError, i32> = Effect::try_delay(|| "12".parse());
    /// assert_eq!(runtime::run_blocking(parsed), Outcome::Succeeded(12));
    /// ```
    pub fn try_delay<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Result<A, E> + Send + 'static,
    {
        Self::from_node(Node::Suspend(Box::new(move || match thunk() {
            Ok(value) => Node::Pure(erase(value)),
            Err(error) => Node::Fail(erase(error)),
        })))
    }

    /// Defers building an effect until it is run.
    ///
    /// Recursive definitions built with `suspend` are stack safe.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// fn count_down(n: u64) -> Effect<String, u64> {
    ///     Effect::suspend(move || {
    ///         if n == 0 {
    ///             Effect::succeed(0)
    ///         } else {
    ///             count_down(n - 1)
    ///         }
    ///     })
    /// }
    ///
    /// assert_eq!(runtime::run_blocking(count_down(100_000)), Outcome::Succeeded(0));
    /// ```
    pub fn suspend<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Self + Send + 'static,
    {
        Self::from_node(Node::Suspend(Box::new(move || thunk().node)))
    }

    /// Suspends until `register` completes the given [`Callback`].
    ///
    /// The callback must be completed exactly once.
    pub fn async_callback<F>(register: F) -> Self
    where
        F: FnOnce(Callback<E, A>) + Send + 'static,
    {
        Self::from_node(Node::Async(Box::new(move |callback| {
            register(Callback::new(callback));
        })))
    }

    /// Suspends on a native future. The future is not polled until the
    /// effect runs, and is dropped if the effect is canceled.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<A, E>> + Send + 'static,
    {
        Self::from_node(Node::Await(Box::pin(async move {
            future.await.map(erase).map_err(erase)
        })))
    }

    /// An effect that never completes. It can only be canceled.
    pub fn never() -> Self {
        Self::from_node(Node::Await(Box::pin(futures::future::pending())))
    }
}

impl<E: Send + 'static> Effect<E, ()> {
    /// An effect that succeeds with `()`.
    pub fn unit() -> Self {
        Self::from_node(Node::unit())
    }

    /// Suspends for `duration` on the runtime's timer.
    pub fn sleep(duration: Duration) -> Self {
        Self::from_node(Node::Await(Box::pin(async move {
            tokio::time::sleep(duration).await;
            Ok(erase(()))
        })))
    }

    /// Moves the rest of the computation onto `context`.
    pub fn shift(context: ExecutionContext) -> Self {
        Self::from_node(Node::ContinueOn(context))
    }
}

// =============================================================================
// Sequencing
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Transforms the success value. Failures pass through untouched.
    pub fn map<B, F>(self, function: F) -> Effect<E, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        Effect::from_node(Node::Map(
            Child::new(self.node),
            Box::new(move |value| erase(function(unerase::<A>(value)))),
        ))
    }

    /// Runs `self`, then the effect built from its value.
    ///
    /// On failure `function` is never called.
    pub fn flat_map<B, F>(self, function: F) -> Effect<E, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Effect<E, B> + Send + 'static,
    {
        Effect::from_node(Node::FlatMap(
            Child::new(self.node),
            Box::new(move |value| function(unerase::<A>(value)).node),
        ))
    }

    /// Alias for [`flat_map`](Self::flat_map).
    pub fn and_then<B, F>(self, function: F) -> Effect<E, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Effect<E, B> + Send + 'static,
    {
        self.flat_map(function)
    }

    /// Runs `self`, discards its value, then runs `next`.
    pub fn then<B>(self, next: Effect<E, B>) -> Effect<E, B>
    where
        B: Send + 'static,
    {
        self.flat_map(move |_| next)
    }

    /// Runs `self` then `other` in sequence and combines their values.
    pub fn map2<B, C, F>(self, other: Effect<E, B>, function: F) -> Effect<E, C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: FnOnce(A, B) -> C + Send + 'static,
    {
        self.flat_map(move |a| other.map(move |b| function(a, b)))
    }

    /// Runs `self` then `other` in sequence and pairs their values.
    pub fn product<B>(self, other: Effect<E, B>) -> Effect<E, (A, B)>
    where
        B: Send + 'static,
    {
        self.map2(other, |a, b| (a, b))
    }

    /// Discards the success value.
    pub fn as_unit(self) -> Effect<E, ()> {
        self.map(|_| ())
    }

    /// Runs the rest of the computation on `context` once `self` succeeds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, ExecutionContext, Outcome, runtime};
    ///
    /// let effect: Effect<String, i32> = Effect::succeed(1)
    ///     .continue_on(ExecutionContext::global())
    ///     .map(|x| x + 1);
    /// assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(2));
    /// ```
    pub fn continue_on(self, context: ExecutionContext) -> Self {
        self.flat_map(move |value| Effect::shift(context).map(move |()| value))
    }
}

// =============================================================================
// Error Handling
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Transforms the failure. Successes pass through untouched.
    pub fn map_error<E2, F>(self, function: F) -> Effect<E2, A>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        Effect::from_node(Node::HandleErrorWith(
            Child::new(self.node),
            Box::new(move |error| Node::Fail(erase(function(unerase::<E>(error))))),
        ))
    }

    /// Recovers from a failure by running the effect built from it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// let recovered: Effect<String, usize> = Effect::<String, usize>::fail("oops".to_string())
    ///     .handle_error_with(|error| Effect::succeed(error.len()));
    /// assert_eq!(runtime::run_blocking(recovered), Outcome::Succeeded(4));
    /// ```
    pub fn handle_error_with<E2, F>(self, handler: F) -> Effect<E2, A>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> Effect<E2, A> + Send + 'static,
    {
        Effect::from_node(Node::HandleErrorWith(
            Child::new(self.node),
            Box::new(move |error| handler(unerase::<E>(error)).node),
        ))
    }

    /// Recovers from a failure with a plain value.
    pub fn handle_error<F>(self, handler: F) -> Self
    where
        F: FnOnce(E) -> A + Send + 'static,
    {
        self.handle_error_with(move |error| Self::succeed(handler(error)))
    }

    /// Exposes the failure as a value, so the result never fails with `E`.
    pub fn attempt<E2>(self) -> Effect<E2, Result<A, E>>
    where
        E2: Send + 'static,
    {
        self.map(Ok).handle_error_with(|error| Effect::succeed(Err(error)))
    }
}

// =============================================================================
// Finalizers
// =============================================================================

impl<E: Clone + Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Treats `self` as the acquisition of a resource, uses it, and always
    /// releases it.
    ///
    /// `release` receives the resource and how the usage ended. It runs
    /// exactly once whether `use_fn` succeeds, fails, or is canceled, and it
    /// cannot itself be canceled. Acquisition cannot be canceled either; if
    /// cancellation is requested while acquiring, the resource is released
    /// right after it is acquired.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, ExitCase, Outcome, runtime};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let seen = Arc::new(Mutex::new(None));
    /// let recorder = Arc::clone(&seen);
    ///
    /// let effect: Effect<String, ()> = Effect::succeed("handle").bracket_case(
    ///     move |_handle, case| {
    ///         *recorder.lock().unwrap() = Some(case);
    ///         Effect::unit()
    ///     },
    ///     |_handle| Effect::fail("broken".to_string()),
    /// );
    ///
    /// assert_eq!(runtime::run_blocking(effect), Outcome::Errored("broken".to_string()));
    /// assert_eq!(
    ///     *seen.lock().unwrap(),
    ///     Some(ExitCase::Error("broken".to_string()))
    /// );
    /// ```
    pub fn bracket_case<B, R, U>(self, release: R, use_fn: U) -> Effect<E, B>
    where
        A: Clone,
        B: Send + 'static,
        R: FnOnce(A, ExitCase<E>) -> Effect<E, ()> + Send + 'static,
        U: FnOnce(A) -> Effect<E, B> + Send + 'static,
    {
        Effect::from_node(bracket_node(self, release, move |resource| use_fn(resource).node))
    }

    /// Like [`bracket_case`](Self::bracket_case) for releases that do not
    /// care how the usage ended.
    pub fn bracket<B, R, U>(self, release: R, use_fn: U) -> Effect<E, B>
    where
        A: Clone,
        B: Send + 'static,
        R: FnOnce(A) -> Effect<E, ()> + Send + 'static,
        U: FnOnce(A) -> Effect<E, B> + Send + 'static,
    {
        self.bracket_case(move |resource, _| release(resource), use_fn)
    }

    /// Runs `finalizer` after `self`, observing how it ended.
    pub fn guarantee_case<F>(self, finalizer: F) -> Self
    where
        F: FnOnce(ExitCase<E>) -> Effect<E, ()> + Send + 'static,
    {
        Effect::<E, ()>::unit().bracket_case(move |(), case| finalizer(case), move |()| self)
    }

    /// Runs `finalizer` after `self`, however it ended.
    pub fn guarantee(self, finalizer: Effect<E, ()>) -> Self {
        self.guarantee_case(move |_| finalizer)
    }

    /// Runs `finalizer` only if `self` is canceled.
    pub fn on_cancel(self, finalizer: Effect<E, ()>) -> Self {
        self.guarantee_case(move |case| match case {
            ExitCase::Canceled => finalizer,
            ExitCase::Completed | ExitCase::Error(_) => Effect::unit(),
        })
    }
}

/// Builds a bracket node whose usage is an already erased node.
pub(crate) fn bracket_node<E, A, R, U>(acquire: Effect<E, A>, finalizer: R, use_node: U) -> Node
where
    E: Clone + Send + 'static,
    A: Clone + Send + 'static,
    R: FnOnce(A, ExitCase<E>) -> Effect<E, ()> + Send + 'static,
    U: FnOnce(A) -> Node + Send + 'static,
{
    Node::Bracket(Box::new(BracketNode {
        acquire: acquire.node,
        split: Box::new(move |resource: Erased| {
            let resource = unerase::<A>(resource);
            let for_release = resource.clone();
            let release: ReleaseFn = Box::new(move |exit: &Exit| {
                let case = match exit {
                    Exit::Succeeded(_) => ExitCase::Completed,
                    Exit::Errored(error) => ExitCase::Error(unerase_ref::<E>(error).clone()),
                    Exit::Canceled => ExitCase::Canceled,
                };
                finalizer(for_release, case).node
            });
            let usage = Node::Suspend(Box::new(move || use_node(resource)));
            (usage, release)
        }),
    }))
}

// =============================================================================
// Racing
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Runs both effects concurrently; the first to finish wins and the
    /// other is canceled.
    ///
    /// A failure finishes the race as much as a success does. When both
    /// finish on the same poll, `self` wins. The race completes only after
    /// the loser's finalizers have run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::control::Either;
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// let effect = Effect::<String, i32>::never().race(Effect::succeed("fast"));
    /// assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(Either::Right("fast")));
    /// ```
    pub fn race<B>(self, other: Effect<E, B>) -> Effect<E, Either<A, B>>
    where
        B: Send + 'static,
    {
        Effect::from_node(Node::Map(
            Child::new(Node::Race(Child::new(self.node), Child::new(other.node))),
            Box::new(|winner| {
                let winner = unerase::<Either<Erased, Erased>>(winner)
                    .map_left(unerase::<A>)
                    .map_right(unerase::<B>);
                erase(winner)
            }),
        ))
    }

    /// Races two effects of the same type, keeping the winner's value.
    pub fn race_first(self, other: Self) -> Self {
        self.race(other).map(Either::into_inner)
    }

    /// Fails with `error` unless `self` finishes within `duration`.
    pub fn timeout_with(self, duration: Duration, error: E) -> Self {
        let deadline = Effect::sleep(duration).flat_map(move |()| Self::fail(error));
        self.race_first(deadline)
    }

    /// Fails with [`TimeoutError`] unless `self` finishes within `duration`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use effio::effect::{Effect, Outcome, TimeoutError, runtime};
    ///
    /// let slow: Effect<TimeoutError, ()> = Effect::never();
    /// let outcome = runtime::run_blocking(slow.timeout(Duration::from_millis(10)));
    /// assert_eq!(
    ///     outcome,
    ///     Outcome::Errored(TimeoutError { duration: Duration::from_millis(10) })
    /// );
    /// ```
    pub fn timeout(self, duration: Duration) -> Self
    where
        E: From<TimeoutError>,
    {
        self.timeout_with(duration, E::from(TimeoutError { duration }))
    }
}

// =============================================================================
// Parallel Composition
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Runs both effects concurrently and pairs their values.
    ///
    /// If either fails, the other is canceled. The reported failure is the one
    /// of the lowest-indexed operand that actually failed; an operand that was
    /// canceled because of a sibling's failure does not count.
    pub fn par_zip<B>(self, other: Effect<E, B>) -> Effect<E, (A, B)>
    where
        B: Send + 'static,
    {
        Effect::<E, Vec<Erased>>::from_node(Node::Parallel(vec![self.node, other.node])).map(
            |values| {
                let mut values = values.into_iter();
                let a = next_operand::<A>(&mut values);
                let b = next_operand::<B>(&mut values);
                (a, b)
            },
        )
    }

    /// Runs both effects concurrently and combines their values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, Outcome, runtime};
    ///
    /// let sum = Effect::<String, i32>::succeed(2).par_map(Effect::succeed(3), |a, b| a + b);
    /// assert_eq!(runtime::run_blocking(sum), Outcome::Succeeded(5));
    /// ```
    pub fn par_map<B, C, F>(self, other: Effect<E, B>, function: F) -> Effect<E, C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: FnOnce(A, B) -> C + Send + 'static,
    {
        self.par_zip(other).map(move |(a, b)| function(a, b))
    }
}

/// Takes the next parallel result and restores its type.
pub(crate) fn next_operand<T: 'static>(values: &mut impl Iterator<Item = Erased>) -> T {
    match values.next() {
        Some(value) => unerase(value),
        None => panic!("effio internal error: parallel result has fewer values than operands"),
    }
}

// =============================================================================
// Running
// =============================================================================

impl<E: Send + 'static, A: Send + 'static> Effect<E, A> {
    /// Starts interpreting the effect on the current execution context.
    ///
    /// Dropping the returned future cancels the run. Releases of resources
    /// already acquired still run in the background.
    pub fn run(self) -> Run<E, A> {
        Run::new(self.node, CancelToken::new(), ExecutionContext::current())
    }

    /// Like [`run`](Self::run), canceled when `token` is.
    pub fn run_with(self, token: &CancelToken) -> Run<E, A> {
        Run::new(self.node, token.child(), ExecutionContext::current())
    }

    /// Like [`run`](Self::run), on the given execution context.
    pub fn run_on(self, context: ExecutionContext) -> Run<E, A> {
        Run::new(self.node, CancelToken::new(), context)
    }

    /// Spawns the effect on its own task.
    pub fn start(self) -> Fiber<E, A> {
        self.start_on(ExecutionContext::current())
    }

    /// Spawns the effect on a task of the given execution context.
    pub fn start_on(self, context: ExecutionContext) -> Fiber<E, A> {
        let token = CancelToken::new();
        let run = Run::new(self.node, token.clone(), context.clone());
        Fiber::new(token, context.spawn(run))
    }

    /// Spawns the effect and hands its outcome to `callback`.
    ///
    /// The returned fiber succeeds with `()` once the callback has returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effio::effect::{Effect, Outcome, runtime};
    /// use std::sync::mpsc;
    ///
    /// let (sender, receiver) = mpsc::channel();
    /// runtime::run_blocking(async move {
    ///     let fiber = Effect::<String, i32>::succeed(9).run_async(move |outcome| {
    ///         sender.send(outcome).unwrap();
    ///     });
    ///     fiber.join().await
    /// });
    /// assert_eq!(receiver.recv().unwrap(), Outcome::Succeeded(9));
    /// ```
    pub fn run_async<F>(self, callback: F) -> Fiber<std::convert::Infallible, ()>
    where
        F: FnOnce(Outcome<E, A>) + Send + 'static,
    {
        let token = CancelToken::new();
        let context = ExecutionContext::current();
        let run: Run<E, A> = Run::new(self.node, token.clone(), context.clone());
        let handle = context.spawn(async move {
            callback(run.await);
            Outcome::Succeeded(())
        });
        Fiber::new(token, handle)
    }
}

impl<E: Send + 'static, A: Send + 'static> IntoFuture for Effect<E, A> {
    type Output = Outcome<E, A>;
    type IntoFuture = Run<E, A>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

impl<E: Send + 'static, A: Send + 'static> From<Result<A, E>> for Effect<E, A> {
    fn from(result: Result<A, E>) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Io<A> = Effect<String, A>;

    #[rstest]
    #[tokio::test]
    async fn succeed_and_fail() {
        assert_eq!(Io::succeed(1).await, Outcome::Succeeded(1));
        assert_eq!(
            Io::<i32>::fail("e".to_string()).await,
            Outcome::Errored("e".to_string())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn delay_runs_once_per_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let build = {
            let runs = Arc::clone(&runs);
            move || {
                let runs = Arc::clone(&runs);
                Io::delay(move || runs.fetch_add(1, Ordering::SeqCst))
            }
        };
        let unused = build();
        drop(unused);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        build().await;
        build().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn flat_map_short_circuits_on_failure() {
        let called = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&called);
        let effect = Io::<i32>::fail("stop".to_string()).flat_map(move |x| {
            observer.fetch_add(1, Ordering::SeqCst);
            Io::succeed(x)
        });
        assert_eq!(effect.await, Outcome::Errored("stop".to_string()));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn map_error_and_attempt() {
        let mapped: Effect<usize, i32> = Io::fail("four".to_string()).map_error(|e| e.len());
        assert_eq!(mapped.await, Outcome::Errored(4));

        let attempted: Effect<(), Result<i32, String>> = Io::fail("x".to_string()).attempt();
        assert_eq!(attempted.await, Outcome::Succeeded(Err("x".to_string())));
    }

    #[rstest]
    #[tokio::test]
    async fn handle_error_recovers() {
        let effect = Io::fail("bad".to_string()).handle_error(|e| e.len());
        assert_eq!(effect.await, Outcome::Succeeded(3));
    }

    #[rstest]
    #[tokio::test]
    async fn async_callback_resumes() {
        let effect: Io<i32> = Io::async_callback(|callback| {
            tokio::spawn(async move { callback.succeed(5) });
        });
        assert_eq!(effect.map(|x| x * 2).await, Outcome::Succeeded(10));
    }

    #[rstest]
    #[tokio::test]
    async fn from_future_surfaces_typed_failure() {
        let effect: Io<i32> = Io::from_future(async { Err("late".to_string()) });
        assert_eq!(effect.await, Outcome::Errored("late".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn product_and_map2_run_in_sequence() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let first = {
            let order = Arc::clone(&order);
            Io::delay(move || order.lock().push(1))
        };
        let second = {
            let order = Arc::clone(&order);
            Io::delay(move || order.lock().push(2))
        };
        assert_eq!(first.product(second).await, Outcome::Succeeded(((), ())));
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[rstest]
    #[tokio::test]
    async fn guarantee_runs_after_failure() {
        let finalized = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&finalized);
        let effect = Io::<i32>::fail("f".to_string()).guarantee(Io::delay(move || {
            observer.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(effect.await, Outcome::Errored("f".to_string()));
        assert_eq!(finalized.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn release_failure_replaces_success() {
        let effect = Io::succeed(1).bracket(
            |_| Io::fail("release".to_string()),
            |x| Io::succeed(x + 1),
        );
        assert_eq!(effect.await, Outcome::Errored("release".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn release_failure_does_not_mask_usage_failure() {
        let effect: Io<i32> = Io::succeed(1).bracket(
            |_| Io::fail("release".to_string()),
            |_| Io::fail("usage".to_string()),
        );
        assert_eq!(effect.await, Outcome::Errored("usage".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn race_first_keeps_faster_value() {
        let slow = Io::sleep(Duration::from_secs(5)).map(|()| "slow");
        let fast = Io::sleep(Duration::from_millis(1)).map(|()| "fast");
        assert_eq!(slow.race_first(fast).await, Outcome::Succeeded("fast"));
    }

    #[rstest]
    #[tokio::test]
    async fn timeout_with_custom_error() {
        let effect = Io::<i32>::never().timeout_with(Duration::from_millis(5), "late".to_string());
        assert_eq!(effect.await, Outcome::Errored("late".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn timeout_does_not_fire_for_fast_effects() {
        let effect: Effect<TimeoutError, i32> =
            Effect::succeed(1).timeout(Duration::from_secs(5));
        assert_eq!(effect.await, Outcome::Succeeded(1));
    }

    #[rstest]
    #[tokio::test]
    async fn par_zip_pairs_values() {
        let effect = Io::succeed(2).par_zip(Io::succeed("b"));
        assert_eq!(effect.await, Outcome::Succeeded((2, "b")));
    }

    #[rstest]
    #[tokio::test]
    async fn canceled_fiber_runs_on_cancel_finalizer() {
        let finalized = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&finalized);
        let effect = Io::<()>::never().on_cancel(Io::delay(move || {
            observer.fetch_add(1, Ordering::SeqCst);
        }));
        let fiber = effect.start();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(fiber.cancel_and_join().await, Outcome::Canceled);
        assert_eq!(finalized.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn run_with_observes_external_token() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(Io::<()>::never().run_with(&token).await, Outcome::Canceled);
    }

    #[rstest]
    #[tokio::test]
    async fn from_result_conversion() {
        let effect: Io<i32> = Ok(3).into();
        assert_eq!(effect.await, Outcome::Succeeded(3));
    }
}

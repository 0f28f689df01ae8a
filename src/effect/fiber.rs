//! Running effects: the [`Run`] future and spawned [`Fiber`]s.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use pin_project_lite::pin_project;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::cancel::{CancelToken, DropGuard};
use super::context::ExecutionContext;
use super::exit::Outcome;
use super::interpreter::{Env, run_loop};
use super::node::{Exit, FrameStack, Node};

pin_project! {
    /// A running effect, resolving to its [`Outcome`].
    ///
    /// Dropping a `Run` before it completes cancels the effect. If it was
    /// already polled, the rest of the run moves to a task on its execution
    /// context, where the releases of every resource acquired so far run
    /// with [`ExitCase::Canceled`](super::ExitCase::Canceled).
    #[must_use = "futures do nothing unless polled"]
    pub struct Run<E, A> {
        fiber: Option<BoxFuture<'static, Exit>>,
        guard: Option<DropGuard>,
        context: ExecutionContext,
        started: bool,
        _marker: PhantomData<fn() -> (E, A)>,
    }

    impl<E, A> PinnedDrop for Run<E, A> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            // Cancels the token.
            drop(this.guard.take());
            let Some(fiber) = this.fiber.take() else {
                return;
            };
            if !*this.started {
                return;
            }
            debug!(context = ?this.context.name(), "run dropped before completion; unwinding in the background");
            drop(this.context.spawn(async move {
                let exit = fiber.await;
                trace!(outcome = exit.label(), "detached fiber finished");
            }));
        }
    }
}

impl<E: Send + 'static, A: Send + 'static> Run<E, A> {
    pub(crate) fn new(node: Node, token: CancelToken, context: ExecutionContext) -> Self {
        trace!(context = ?context.name(), "fiber started");
        let guard = token.clone().drop_guard();
        let env = Env::new(token, context.clone());
        Self {
            fiber: Some(run_loop(node, FrameStack::new(), env)),
            guard: Some(guard),
            context,
            started: false,
            _marker: PhantomData,
        }
    }
}

impl<E: 'static, A: 'static> Future for Run<E, A> {
    type Output = Outcome<E, A>;

    fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let Some(fiber) = this.fiber.as_mut() else {
            panic!("effio internal error: run polled after completion");
        };
        *this.started = true;
        match fiber.as_mut().poll(context) {
            Poll::Ready(exit) => {
                *this.fiber = None;
                if let Some(guard) = this.guard.take() {
                    guard.disarm();
                }
                trace!(outcome = exit.label(), "fiber finished");
                Poll::Ready(Outcome::from_exit(exit))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<E, A> std::fmt::Debug for Run<E, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Run")
            .field("started", &self.started)
            .field("finished", &self.fiber.is_none())
            .finish_non_exhaustive()
    }
}

/// An effect running on its own task.
///
/// Dropping a `Fiber` detaches it: the effect keeps running. Use
/// [`cancel`](Self::cancel) to stop it.
///
/// # Examples
///
/// ```rust
/// use effio::effect::{Effect, Outcome, runtime};
///
/// let outcome = runtime::run_blocking(async {
///     let fiber = Effect::<String, i32>::never().start();
///     fiber.cancel();
///     fiber.join().await
/// });
/// assert_eq!(outcome, Outcome::Canceled);
/// ```
pub struct Fiber<E, A> {
    token: CancelToken,
    handle: JoinHandle<Outcome<E, A>>,
}

impl<E: Send + 'static, A: Send + 'static> Fiber<E, A> {
    pub(crate) const fn new(token: CancelToken, handle: JoinHandle<Outcome<E, A>>) -> Self {
        Self { token, handle }
    }

    /// Requests cancellation. Finalizers of the fiber still run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token controlling this fiber.
    pub const fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Returns `true` once the fiber's task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the fiber to finish.
    ///
    /// # Panics
    ///
    /// Resumes the panic if the fiber panicked.
    pub async fn join(self) -> Outcome<E, A> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(_) => Outcome::Canceled,
        }
    }

    /// Cancels the fiber and waits for its finalizers to finish.
    pub async fn cancel_and_join(self) -> Outcome<E, A> {
        self.cancel();
        self.join().await
    }
}

impl<E, A> std::fmt::Debug for Fiber<E, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Fiber")
            .field("token", &self.token)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

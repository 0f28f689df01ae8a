//! The trampolined run loop.
//!
//! A fiber evaluates its current [`Node`] until it reaches an [`Exit`], then
//! unwinds its [`FrameStack`]: `Map` and `Bind` frames consume successes,
//! `Handle` frames consume failures, and `Release` frames see every exit.
//! Suspension happens only at `Async`, `Await`, `ContinueOn`, `Race`,
//! `Parallel` and while a bracket acquires or releases.

use futures::future::{self, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::callback::ErasedCallback;
use super::cancel::CancelToken;
use super::context::ExecutionContext;
use super::node::{
    BracketNode, Erased, ErasedFuture, Exit, Frame, FrameStack, Node, ReleaseFn, erase,
};
use crate::control::Either;

/// What a fiber runs with.
#[derive(Clone, Debug)]
pub(crate) struct Env {
    pub(crate) token: CancelToken,
    pub(crate) context: ExecutionContext,
}

impl Env {
    pub(crate) const fn new(token: CancelToken, context: ExecutionContext) -> Self {
        Self { token, context }
    }

    fn with_token(&self, token: CancelToken) -> Self {
        Self::new(token, self.context.clone())
    }

    fn with_context(&self, context: ExecutionContext) -> Self {
        Self::new(self.token.clone(), context)
    }

    /// Same context, detached from this fiber's cancellation.
    fn uncancelable(&self) -> Self {
        self.with_token(CancelToken::new())
    }
}

/// Interprets `node` with `stack` as its pending continuations.
pub(crate) fn run_loop(node: Node, stack: FrameStack, env: Env) -> BoxFuture<'static, Exit> {
    Box::pin(async move {
        let mut stack = stack;
        let mut current = node;
        'evaluate: loop {
            let mut exit = match current {
                Node::Pure(value) => Exit::Succeeded(value),
                Node::Fail(error) => Exit::Errored(error),
                Node::Suspend(thunk) => {
                    current = thunk();
                    continue 'evaluate;
                }
                Node::Map(source, function) => {
                    stack.push(Frame::Map(function));
                    current = source.into_inner();
                    continue 'evaluate;
                }
                Node::FlatMap(source, function) => {
                    stack.push(Frame::Bind(function));
                    current = source.into_inner();
                    continue 'evaluate;
                }
                Node::HandleErrorWith(source, handler) => {
                    stack.push(Frame::Handle(handler));
                    current = source.into_inner();
                    continue 'evaluate;
                }
                Node::Async(register) => {
                    if env.token.is_cancelled() {
                        Exit::Canceled
                    } else {
                        let (callback, receiver) = ErasedCallback::channel();
                        register(callback);
                        await_callback(receiver, &env.token).await
                    }
                }
                Node::Await(future) => {
                    if env.token.is_cancelled() {
                        Exit::Canceled
                    } else {
                        await_future(future, &env.token).await
                    }
                }
                Node::ContinueOn(context) => {
                    if env.token.is_cancelled() {
                        Exit::Canceled
                    } else {
                        trace!(context = ?context.name(), "shifting to execution context");
                        let remainder =
                            run_loop(Node::unit(), std::mem::take(&mut stack), env.with_context(context.clone()));
                        return join(context.spawn(remainder).await);
                    }
                }
                Node::Bracket(bracket) => {
                    if env.token.is_cancelled() {
                        Exit::Canceled
                    } else {
                        let BracketNode { acquire, split } = *bracket;
                        match run_loop(acquire, FrameStack::new(), env.uncancelable()).await {
                            Exit::Succeeded(resource) => {
                                let (usage, release) = split(resource);
                                stack.push(Frame::Release(release));
                                if env.token.is_cancelled() {
                                    Exit::Canceled
                                } else {
                                    current = usage;
                                    continue 'evaluate;
                                }
                            }
                            failed => failed,
                        }
                    }
                }
                Node::Race(left, right) => race(left.into_inner(), right.into_inner(), &env).await,
                Node::Parallel(operands) => parallel(operands, &env).await,
            };

            loop {
                let Some(frame) = stack.pop() else {
                    return exit;
                };
                exit = match (frame, exit) {
                    (Frame::Map(function), Exit::Succeeded(value)) => Exit::Succeeded(function(value)),
                    (Frame::Bind(function), Exit::Succeeded(value)) => {
                        current = function(value);
                        continue 'evaluate;
                    }
                    (Frame::Handle(handler), Exit::Errored(error)) => {
                        current = handler(error);
                        continue 'evaluate;
                    }
                    (Frame::Release(release), outcome) => {
                        // Cancellation requested during a synchronous usage.
                        let outcome = if env.token.is_cancelled() {
                            Exit::Canceled
                        } else {
                            outcome
                        };
                        run_release(release, outcome, &env).await
                    }
                    (_, outcome) => outcome,
                };
            }
        }
    })
}

async fn await_callback(receiver: oneshot::Receiver<Result<Erased, Erased>>, token: &CancelToken) -> Exit {
    tokio::select! {
        biased;
        received = receiver => match received {
            Ok(Ok(value)) => Exit::Succeeded(value),
            Ok(Err(error)) => Exit::Errored(error),
            Err(_) => panic!("effio: async callback dropped without being invoked"),
        },
        () = token.cancelled() => {
            debug!("cancellation observed while waiting for an async callback");
            Exit::Canceled
        }
    }
}

async fn await_future(future: ErasedFuture, token: &CancelToken) -> Exit {
    tokio::select! {
        biased;
        result = future => match result {
            Ok(value) => Exit::Succeeded(value),
            Err(error) => Exit::Errored(error),
        },
        () = token.cancelled() => {
            debug!("cancellation observed while awaiting a future");
            Exit::Canceled
        }
    }
}

fn join(joined: Result<Exit, tokio::task::JoinError>) -> Exit {
    match joined {
        Ok(exit) => exit,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(_) => Exit::Canceled,
    }
}

/// Runs a release frame. A release failure replaces a success and is
/// otherwise logged and suppressed.
async fn run_release(release: ReleaseFn, outcome: Exit, env: &Env) -> Exit {
    let finalizer = release(&outcome);
    trace!(exit_case = outcome.label(), "running bracket release");
    let released = run_loop(finalizer, FrameStack::new(), env.uncancelable()).await;
    match (released, outcome) {
        (Exit::Errored(error), Exit::Succeeded(_)) => Exit::Errored(error),
        (Exit::Errored(_), outcome) => {
            warn!(
                exit_case = outcome.label(),
                "bracket release failed; keeping the original outcome"
            );
            outcome
        }
        (_, outcome) => outcome,
    }
}

/// Races two nodes on this fiber. The left operand is polled first.
async fn race(left: Node, right: Node, env: &Env) -> Exit {
    let left_token = env.token.child();
    let right_token = env.token.child();
    let left_run = run_loop(left, FrameStack::new(), env.with_token(left_token.clone()));
    let right_run = run_loop(right, FrameStack::new(), env.with_token(right_token.clone()));

    match future::select(left_run, right_run).await {
        future::Either::Left((winner, loser)) => {
            settle_race(winner, Side::Left, loser, &right_token, env).await
        }
        future::Either::Right((winner, loser)) => {
            settle_race(winner, Side::Right, loser, &left_token, env).await
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Left,
    Right,
}

impl Side {
    const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    fn tag(self, exit: Exit) -> Exit {
        match exit {
            Exit::Succeeded(value) => {
                let either: Either<Erased, Erased> = match self {
                    Self::Left => Either::Left(value),
                    Self::Right => Either::Right(value),
                };
                Exit::Succeeded(erase(either))
            }
            other => other,
        }
    }
}

async fn settle_race(
    winner: Exit,
    side: Side,
    loser: BoxFuture<'static, Exit>,
    loser_token: &CancelToken,
    env: &Env,
) -> Exit {
    // An operand canceled on its own does not win while the race is live.
    if matches!(winner, Exit::Canceled) && !env.token.is_cancelled() {
        let remaining = loser.await;
        return side.other().tag(remaining);
    }
    loser_token.cancel();
    let _ = loser.await;
    debug!(winner = ?side, outcome = winner.label(), "race settled; loser canceled");
    side.tag(winner)
}

/// Runs every node concurrently on the fiber's execution context.
///
/// The first failure cancels the rest of the group. Among failures, the one
/// from the lowest operand index is reported.
async fn parallel(operands: Vec<Node>, env: &Env) -> Exit {
    let group = env.token.child();
    let count = operands.len();
    let mut running: FuturesUnordered<_> = operands
        .into_iter()
        .enumerate()
        .map(|(index, operand)| {
            let fiber = run_loop(operand, FrameStack::new(), env.with_token(group.child()));
            let handle = env.context.spawn(fiber);
            async move { (index, handle.await) }
        })
        .collect();

    let mut values: Vec<Option<Erased>> = std::iter::repeat_with(|| None).take(count).collect();
    let mut failure: Option<(usize, Erased)> = None;
    let mut canceled = false;

    while let Some((index, joined)) = running.next().await {
        let exit = match joined {
            Ok(exit) => exit,
            Err(error) if error.is_panic() => {
                group.cancel();
                std::panic::resume_unwind(error.into_panic());
            }
            Err(_) => Exit::Canceled,
        };
        match exit {
            Exit::Succeeded(value) => values[index] = Some(value),
            Exit::Errored(error) => {
                if failure.is_none() {
                    debug!(operand = index, "parallel operand failed; canceling the group");
                    group.cancel();
                }
                if failure.as_ref().is_none_or(|(reported, _)| index < *reported) {
                    failure = Some((index, error));
                }
            }
            Exit::Canceled => canceled = true,
        }
    }

    if let Some((_, error)) = failure {
        return Exit::Errored(error);
    }
    if canceled {
        return Exit::Canceled;
    }
    match values.into_iter().collect::<Option<Vec<Erased>>>() {
        Some(values) => Exit::Succeeded(erase(values)),
        None => panic!("effio internal error: parallel operand finished without a result"),
    }
}

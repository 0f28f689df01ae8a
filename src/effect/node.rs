//! The erased instruction set interpreted by the run loop.
//!
//! Typed [`Effect`](super::Effect) values are thin wrappers over [`Node`].
//! Values cross the interpreter as [`Erased`] boxes and are restored to their
//! static type by the typed continuation that consumes them, which is why a
//! failed downcast is an internal error rather than a user-facing one.

use std::any::{Any, type_name};
use std::future::Future;
use std::pin::Pin;

use smallvec::SmallVec;

use super::callback::ErasedCallback;
use super::context::ExecutionContext;

/// A value whose static type is known only to the continuation consuming it.
pub(crate) type Erased = Box<dyn Any + Send>;

pub(crate) type MapFn = Box<dyn FnOnce(Erased) -> Erased + Send>;
pub(crate) type BindFn = Box<dyn FnOnce(Erased) -> Node + Send>;
pub(crate) type ReleaseFn = Box<dyn FnOnce(&Exit) -> Node + Send>;
pub(crate) type SplitFn = Box<dyn FnOnce(Erased) -> (Node, ReleaseFn) + Send>;
pub(crate) type ErasedFuture = Pin<Box<dyn Future<Output = Result<Erased, Erased>> + Send>>;

#[inline]
pub(crate) fn erase<T: Send + 'static>(value: T) -> Erased {
    Box::new(value)
}

/// Restores the static type of an erased value.
///
/// # Panics
///
/// Panics if the value is not a `T`, which means the interpreter paired a
/// value with the wrong continuation.
pub(crate) fn unerase<T: 'static>(value: Erased) -> T {
    match value.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!("effio internal error: expected a value of type {}", type_name::<T>()),
    }
}

/// Borrowing counterpart of [`unerase`].
pub(crate) fn unerase_ref<T: 'static>(value: &Erased) -> &T {
    match value.downcast_ref::<T>() {
        Some(value) => value,
        None => panic!("effio internal error: expected a value of type {}", type_name::<T>()),
    }
}

/// One instruction of an effect description.
pub(crate) enum Node {
    Pure(Erased),
    Fail(Erased),
    Suspend(Box<dyn FnOnce() -> Self + Send>),
    Map(Child, MapFn),
    FlatMap(Child, BindFn),
    HandleErrorWith(Child, BindFn),
    Async(Box<dyn FnOnce(ErasedCallback) + Send>),
    Await(ErasedFuture),
    ContinueOn(ExecutionContext),
    Bracket(Box<BracketNode>),
    /// Yields an erased `Either<Erased, Erased>`.
    Race(Child, Child),
    /// Yields an erased `Vec<Erased>` in operand order.
    Parallel(Vec<Self>),
}

impl Node {
    pub(crate) fn unit() -> Self {
        Self::Pure(erase(()))
    }

    /// Moves every directly nested node onto `pending`, leaving units behind.
    fn detach_children(&mut self, pending: &mut Vec<Self>) {
        match self {
            Self::Map(source, _) | Self::FlatMap(source, _) | Self::HandleErrorWith(source, _) => {
                pending.push(source.take());
            }
            Self::Race(left, right) => {
                pending.push(left.take());
                pending.push(right.take());
            }
            Self::Parallel(operands) => pending.append(operands),
            Self::Bracket(bracket) => pending.push(std::mem::replace(&mut bracket.acquire, Self::unit())),
            Self::Pure(_)
            | Self::Fail(_)
            | Self::Suspend(_)
            | Self::Async(_)
            | Self::Await(_)
            | Self::ContinueOn(_) => {}
        }
    }
}

/// A boxed sub-node.
///
/// Composed effects nest one `Child` per combinator, so an unrun chain can be
/// arbitrarily deep. Dropping a `Child` dismantles its subtree with a
/// worklist instead of recursing.
pub(crate) struct Child(Box<Node>);

impl Child {
    #[inline]
    pub(crate) fn new(node: Node) -> Self {
        Self(Box::new(node))
    }

    #[inline]
    pub(crate) fn into_inner(mut self) -> Node {
        self.take()
    }

    fn take(&mut self) -> Node {
        std::mem::replace(&mut *self.0, Node::unit())
    }
}

impl Drop for Child {
    fn drop(&mut self) {
        let mut pending = vec![self.take()];
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

/// Acquire, then split the resource into a usage and its release.
pub(crate) struct BracketNode {
    pub(crate) acquire: Node,
    pub(crate) split: SplitFn,
}

/// How a node (or a whole run) ended, before types are restored.
pub(crate) enum Exit {
    Succeeded(Erased),
    Errored(Erased),
    Canceled,
}

impl Exit {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "completed",
            Self::Errored(_) => "error",
            Self::Canceled => "canceled",
        }
    }
}

/// A pending continuation on the interpreter's stack.
pub(crate) enum Frame {
    /// Applied to a success.
    Map(MapFn),
    /// Applied to a success, producing the next node.
    Bind(BindFn),
    /// Applied to a failure, producing the recovery node.
    Handle(BindFn),
    /// Applied to every exit.
    Release(ReleaseFn),
}

const INLINE_FRAMES: usize = 16;

/// The continuation stack of one fiber.
///
/// Nested `map`/`flat_map` chains are flattened onto this stack instead of
/// the native call stack, so interpretation is stack safe.
#[derive(Default)]
pub(crate) struct FrameStack {
    frames: SmallVec<[Frame; INLINE_FRAMES]>,
}

impl FrameStack {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }
}
